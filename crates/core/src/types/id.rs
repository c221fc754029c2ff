//! Newtype IDs for type-safe entity references.
//!
//! The backend assigns plain integer identifiers to every resource. Use the
//! `define_id!` macro to wrap them so a cart id can never be passed where a
//! cart item id is expected.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>`, `Into<i32>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use biblio_core::define_id;
/// define_id!(ShelfId);
/// define_id!(LoanId);
///
/// let shelf_id = ShelfId::new(1);
/// let loan_id = LoanId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: ShelfId = loan_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(CartId);
define_id!(CartItemId);
define_id!(ProductId);
define_id!(OrderId);

impl UserId {
    /// Owner id the backend uses for carts created without a known user.
    pub const ANONYMOUS: Self = Self(0);

    /// Whether this is the anonymous placeholder owner.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.0 == Self::ANONYMOUS.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_parse() {
        let id = CartId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(" 42 ".parse::<CartId>().unwrap(), id);
        assert!("forty-two".parse::<CartId>().is_err());
    }

    #[test]
    fn test_id_serde_is_transparent() {
        let json = serde_json::to_string(&ProductId::new(100)).unwrap();
        assert_eq!(json, "100");

        let parsed: CartItemId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed.as_i32(), 7);
    }

    #[test]
    fn test_anonymous_user() {
        assert!(UserId::ANONYMOUS.is_anonymous());
        assert!(UserId::new(0).is_anonymous());
        assert!(!UserId::new(42).is_anonymous());
    }
}
