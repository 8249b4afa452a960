/// Edit to an optional task field.
///
/// Distinguishes "leave it alone" from "clear it", which a bare `Option`
/// cannot express:
/// - `NoChange`: keep the existing value
/// - `Set(value)`: replace the value
/// - `Clear`: remove the value
///
/// ```
/// use taskboard_domain::FieldUpdate;
///
/// let mut due = Some("2026-10-20".to_string());
/// FieldUpdate::<String>::NoChange.apply_to(&mut due);
/// assert_eq!(due.as_deref(), Some("2026-10-20"));
///
/// FieldUpdate::<String>::Clear.apply_to(&mut due);
/// assert_eq!(due, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldUpdate<T> {
    #[default]
    NoChange,
    Set(T),
    Clear,
}

impl<T> FieldUpdate<T> {
    pub fn apply_to(self, field: &mut Option<T>) {
        match self {
            FieldUpdate::NoChange => {}
            FieldUpdate::Set(value) => *field = Some(value),
            FieldUpdate::Clear => *field = None,
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, FieldUpdate::NoChange)
    }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
    /// `Some` sets, `None` clears.
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(value) => FieldUpdate::Set(value),
            None => FieldUpdate::Clear,
        }
    }
}
