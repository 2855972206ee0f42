//! Macros for reducing boilerplate when defining resources

/// Implement [`Resource`](crate::core::entity::Resource) for a payload struct
///
/// Generates the resource names and `field_value` for the listed fields
/// (each field type must implement `Into<FieldValue>`), and delegates the
/// capability declaration to the given function.
///
/// # Example
/// ```rust,ignore
/// impl_resource!(
///     Ticket,
///     "ticket",
///     "tickets",
///     [summary, description, status],
///     ticket_capabilities
/// );
/// ```
#[macro_export]
macro_rules! impl_resource {
    (
        $type:ident,
        $singular:expr,
        $plural:expr,
        [$($field:ident),* $(,)?],
        $capabilities:path
    ) => {
        impl $crate::core::entity::Resource for $type {
            fn resource_name() -> &'static str {
                $plural
            }

            fn resource_name_singular() -> &'static str {
                $singular
            }

            fn capabilities() -> $crate::core::error::Result<$crate::core::capability::Capabilities> {
                $capabilities()
            }

            fn field_value(&self, field: &str) -> Option<$crate::core::field::FieldValue> {
                match field {
                    $(
                        stringify!($field) => Some($crate::core::field::FieldValue::from(
                            self.$field.clone(),
                        )),
                    )*
                    _ => None,
                }
            }
        }
    };
}
