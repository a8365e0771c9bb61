//! `define_port_error!` builds the error enums returned by port traits.
//!
//! Each variant gets a snake_case constructor whose fields accept
//! `impl Into<T>`, so adapters can write `CourseRepositoryError::query(err.to_string())`.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum LedgerCheckError {
            Unavailable { message: String } => "ledger unavailable: {message}",
            TooManyRetries { attempts: u32 } => "gave up after {attempts} attempts",
            Rejected { provider: String, code: u16 } => "{provider} rejected with {code}",
            Missing => "nothing recorded",
        }
    }

    #[test]
    fn string_fields_take_borrowed_text() {
        let err = LedgerCheckError::unavailable("pool closed");
        assert_eq!(err.to_string(), "ledger unavailable: pool closed");
    }

    #[test]
    fn numeric_fields_keep_their_type() {
        let err = LedgerCheckError::too_many_retries(3_u32);
        assert_eq!(err, LedgerCheckError::TooManyRetries { attempts: 3 });
    }

    #[test]
    fn mixed_and_unit_variants_construct() {
        assert_eq!(
            LedgerCheckError::rejected("stripe", 402_u16).to_string(),
            "stripe rejected with 402"
        );
        assert_eq!(LedgerCheckError::missing(), LedgerCheckError::Missing);
    }
}
