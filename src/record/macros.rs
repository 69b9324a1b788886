/// Declares a record struct and its [`Record`](crate::record::Record) impl.
///
/// Fields are public. `= expr` gives a field a default value and
/// `=> path` a default factory called each time the default is needed.
/// The struct derives serde's `Serialize`, so the calling crate needs
/// `serde` as a dependency. `Deserialize` goes through
/// [`Record::from_fields`](crate::record::Record::from_fields), so defaults
/// and unknown-field checks also hold for records nested in other records.
///
/// ```
/// record_field::record! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct SongWithLikes {
///         name: String,
///         like_count: i64 = 0,
///         liked_by: Vec<String> => Vec::new,
///     }
/// }
/// ```
#[macro_export]
macro_rules! record {
    (@parse $head:tt [$($done:tt)*] $field:ident : $ty:ty = $default:expr $(, $($rest:tt)*)?) => {
        $crate::record!(@parse $head [$($done)* ($field, $ty, value, $default)] $($($rest)*)?);
    };
    (@parse $head:tt [$($done:tt)*] $field:ident : $ty:ty => $factory:expr $(, $($rest:tt)*)?) => {
        $crate::record!(@parse $head [$($done)* ($field, $ty, factory, $factory)] $($($rest)*)?);
    };
    (@parse $head:tt [$($done:tt)*] $field:ident : $ty:ty $(, $($rest:tt)*)?) => {
        $crate::record!(@parse $head [$($done)* ($field, $ty, required, ())] $($($rest)*)?);
    };
    (@parse
        [$(#[$meta:meta])* $vis:vis struct $name:ident]
        [$(($field:ident, $ty:ty, $kind:ident, $default:expr))*]
    ) => {
        $(#[$meta])*
        #[derive($crate::serde::Serialize)]
        $vis struct $name {
            $(pub $field: $ty,)*
        }

        impl $crate::record::Record for $name {
            const NAME: &'static str = stringify!($name);

            fn fields() -> &'static [$crate::record::FieldSpec] {
                const FIELDS: &[$crate::record::FieldSpec] = &[
                    $($crate::record!(@spec $field, $ty, $kind, $default),)*
                ];
                FIELDS
            }

            fn from_complete(
                #[allow(unused_mut)]
                mut object: $crate::serde_json::Map<::std::string::String, $crate::serde_json::Value>,
            ) -> $crate::Result<Self> {
                ::std::result::Result::Ok(Self {
                    $($field: $crate::record::take_field::<Self, $ty>(&mut object, stringify!($field))?,)*
                })
            }
        }

        impl<'de> $crate::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: $crate::serde::Deserializer<'de>,
            {
                let fields = <$crate::serde_json::Map<::std::string::String, $crate::serde_json::Value>
                    as $crate::serde::Deserialize>::deserialize(deserializer)?;
                <Self as $crate::record::Record>::from_fields(fields)
                    .map_err(<D::Error as $crate::serde::de::Error>::custom)
            }
        }
    };
    (@spec $field:ident, $ty:ty, required, $default:expr) => {
        $crate::record::FieldSpec::required(stringify!($field))
    };
    (@spec $field:ident, $ty:ty, value, $default:expr) => {
        $crate::record::FieldSpec::with_default(stringify!($field), || {
            $crate::record::default_json::<$ty>($default)
        })
    };
    (@spec $field:ident, $ty:ty, factory, $factory:expr) => {
        $crate::record::FieldSpec::with_factory(stringify!($field), || {
            $crate::record::default_json::<$ty>(($factory)())
        })
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($body:tt)*
        }
    ) => {
        $crate::record!(@parse [$(#[$meta])* $vis struct $name] [] $($body)*);
    };
}
