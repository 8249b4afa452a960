/// A detached, editable view of an entity.
///
/// Editing surfaces copy the fields they own out of the entity, let the user
/// change them locally, and write them back in one step.
pub trait Editable<T> {
    fn from_entity(entity: &T) -> Self;
    fn apply_to(self, entity: &mut T);
}
