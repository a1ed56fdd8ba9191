//! Status and category enums stored as text columns

use serde::{Deserialize, Serialize};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef},
    Decode, Encode, Postgres,
};
use utoipa::ToSchema;

/// Declares an enum persisted as its snake_case text label
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $label)]
                $variant
            ),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($name), s)),
                }
            }
        }

        impl sqlx::Type<Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <String as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $name {
            fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
                let s: &str = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

text_enum! {
    /// Payroll document lifecycle: draft → calculated → approved → paid
    pub enum SalaryStatus {
        Draft => "draft",
        Calculated => "calculated",
        Approved => "approved",
        Paid => "paid",
    }
}

text_enum! {
    /// Vacation request lifecycle: draft → pending → approved | rejected
    pub enum VacationStatus {
        Draft => "draft",
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

text_enum! {
    pub enum VacationType {
        Annual => "annual",
        Unpaid => "unpaid",
        Study => "study",
        Maternity => "maternity",
        Sick => "sick",
    }
}

text_enum! {
    /// Timesheet correction review state: pending → approved | rejected
    pub enum CorrectionStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

text_enum! {
    /// Classification of a timesheet day
    pub enum DayType {
        Work => "work",
        Weekend => "weekend",
        Holiday => "holiday",
        Vacation => "vacation",
        Sick => "sick",
        BusinessTrip => "business_trip",
        Absent => "absent",
    }
}

text_enum! {
    pub enum PersonnelStatus {
        Active => "active",
        OnLeave => "on_leave",
        Terminated => "terminated",
    }
}

text_enum! {
    pub enum ReceptionStatus {
        Scheduled => "scheduled",
        Held => "held",
        Cancelled => "cancelled",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_parse_back() {
        for status in [
            SalaryStatus::Draft,
            SalaryStatus::Calculated,
            SalaryStatus::Approved,
            SalaryStatus::Paid,
        ] {
            assert_eq!(status.as_str().parse::<SalaryStatus>(), Ok(status));
        }
        assert_eq!("business_trip".parse::<DayType>(), Ok(DayType::BusinessTrip));
    }

    #[test]
    fn test_unknown_label_rejected() {
        let err = "archived".parse::<VacationStatus>().unwrap_err();
        assert!(err.contains("VacationStatus"));
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&PersonnelStatus::OnLeave).unwrap();
        assert_eq!(json, "\"on_leave\"");
        let parsed: CorrectionStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(parsed, CorrectionStatus::Rejected);
    }
}
