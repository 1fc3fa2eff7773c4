//! Macros for reducing boilerplate when defining tenant records

/// Define a tenant-scoped record with automatic trait implementations
///
/// Generates the struct with the base fields (`id`, `company_id`,
/// `created_at`, `updated_at`) followed by the specific fields, implements
/// [`Entity`](crate::core::entity::Entity), and adds a `new(company_id, ...)`
/// constructor taking the specific fields in declaration order.
///
/// # Example
///
/// ```rust,ignore
/// impl_company_entity!(
///     /// A branch office
///     Branch,
///     "branch",
///     "branches",
///     {
///         name: String,
///         #[serde(default)]
///         address: Option<String>,
///     }
/// );
///
/// let branch = Branch::new(company_id, "Pune".to_string(), None);
/// ```
#[macro_export]
macro_rules! impl_company_entity {
    (
        $(#[$meta:meta])*
        $type:ident,
        $singular:expr,
        $plural:expr,
        {
            $( $(#[$field_meta:meta])* $field:ident : $field_type:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $type {
            /// Unique identifier for this record
            pub id: ::uuid::Uuid,

            /// Tenant the record belongs to
            pub company_id: ::uuid::Uuid,

            pub created_at: ::chrono::DateTime<::chrono::Utc>,

            pub updated_at: ::chrono::DateTime<::chrono::Utc>,

            $( $(#[$field_meta])* pub $field : $field_type ),*
        }

        impl $crate::core::entity::Entity for $type {
            fn resource_name() -> &'static str {
                $plural
            }

            fn resource_name_singular() -> &'static str {
                $singular
            }

            fn id(&self) -> ::uuid::Uuid {
                self.id
            }

            fn company_id(&self) -> ::uuid::Uuid {
                self.company_id
            }

            fn created_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.created_at
            }

            fn updated_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.updated_at
            }

            fn touch(&mut self) {
                self.updated_at = ::chrono::Utc::now();
            }
        }

        impl $type {
            /// Create a new record for `company_id`
            #[allow(clippy::too_many_arguments)]
            pub fn new(company_id: ::uuid::Uuid, $( $field: $field_type ),*) -> Self {
                let now = ::chrono::Utc::now();
                Self {
                    id: ::uuid::Uuid::new_v4(),
                    company_id,
                    created_at: now,
                    updated_at: now,
                    $( $field ),*
                }
            }
        }
    };
}
