//! `define_port_error!`, the declaration helper for driven-port error enums.

/// Declare a port error enum with a `thiserror` message per variant and a
/// snake-case constructor for each one.
///
/// Constructors take every field as `impl Into<T>`, so adapters can pass
/// `&str` or a formatted `String` for message fields:
///
/// ```ignore
/// define_port_error! {
///     pub enum LanguageModelError {
///         Status { status: u16, message: String } => "status {status}: {message}",
///         Unavailable => "provider unavailable",
///     }
/// }
///
/// let err = LanguageModelError::status(502_u16, "bad gateway");
/// let gone = LanguageModelError::unavailable();
/// ```
macro_rules! define_port_error {
    (@constructor $variant:ident) => {
        ::paste::paste! {
            #[doc = "Build the `" $variant "` variant."]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@constructor $variant:ident { $($field:ident : $ty:ty),* }) => {
        ::paste::paste! {
            #[doc = "Build the `" $variant "` variant."]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };

    (
        $(#[$enum_attr:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_attr:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:literal
            ),* $(,)?
        }
    ) => {
        $(#[$enum_attr])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_attr])*
                #[error($message)]
                $variant $( { $($field: $ty),* } )?,
            )*
        }

        impl $name {
            $( define_port_error!(@constructor $variant $( { $($field : $ty),* } )?); )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    define_port_error! {
        /// Errors raised by a test upload adapter.
        pub enum UploadError {
            Rejected { status: u16, reason: String } => "upload rejected with {status}: {reason}",
            Quota { limit: u64 } => "upload exceeds the {limit} byte quota",
            Offline => "upload target is offline",
        }
    }

    #[rstest]
    #[case(UploadError::rejected(413_u16, "too large"), "upload rejected with 413: too large")]
    #[case(UploadError::quota(1024_u64), "upload exceeds the 1024 byte quota")]
    #[case(UploadError::offline(), "upload target is offline")]
    fn constructors_render_their_messages(#[case] err: UploadError, #[case] expected: &str) {
        assert_eq!(err.to_string(), expected);
    }

    #[rstest]
    fn string_fields_accept_owned_and_borrowed_text() {
        let owned = UploadError::rejected(400_u16, format!("field {}", "path"));
        assert_eq!(owned, UploadError::rejected(400_u16, "field path"));
        assert!(matches!(owned, UploadError::Rejected { status: 400, .. }));
    }
}
