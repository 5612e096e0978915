//! Newtype wrappers around `i64` for all domain entity identifiers.
//!
//! Identifiers are database-assigned and ordered; the copy allocator relies
//! on that order for its lowest-id tie-break. Distinct types prevent passing
//! a `CopyId` where a `ReservationId` is expected. With the `sqlx` feature
//! each type also encodes/decodes as PostgreSQL `INT8`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Macro to define a newtype ID wrapper around `i64`.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Return the raw integer value.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }

        #[cfg(feature = "sqlx")]
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
            }
        }

        #[cfg(feature = "sqlx")]
        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as sqlx::Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <i64 as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }

        #[cfg(feature = "sqlx")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as sqlx::Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                <i64 as sqlx::Decode<'r, sqlx::Postgres>>::decode(value).map(Self)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a library user.
    UserId
);

define_id!(
    /// Unique identifier for a catalog publication.
    PublicationId
);

define_id!(
    /// Unique identifier for a physical copy.
    CopyId
);

define_id!(
    /// Unique identifier for a reservation.
    ReservationId
);

define_id!(
    /// Unique identifier for a loan.
    LoanId
);

define_id!(
    /// Unique identifier for a user message.
    MessageId
);

define_id!(
    /// Unique identifier for an audit log entry.
    AuditLogId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_id_orders_numerically() {
        let mut ids = vec![CopyId(12), CopyId(3), CopyId(7)];
        ids.sort();
        assert_eq!(ids, vec![CopyId(3), CopyId(7), CopyId(12)]);
    }

    #[test]
    fn test_loan_id_from_str() {
        let id: LoanId = " 42 ".parse().expect("should parse");
        assert_eq!(id, LoanId(42));
        assert!("forty-two".parse::<LoanId>().is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&ReservationId(5)).expect("serialize");
        assert_eq!(json, "5");
        let parsed: ReservationId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, ReservationId(5));
    }
}
