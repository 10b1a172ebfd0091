use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(QualityStatus {
    Pending => "pending",
    Accepted => "accepted",
    Rejected => "rejected",
    Borderline => "borderline",
});

str_enum!(GateStatus {
    Passed => "passed",
    Failed => "failed",
});

str_enum!(ModelVerdict {
    Accepted => "accepted",
    Rejected => "rejected",
    AcceptedNoModel => "accepted_no_llm",
    AcceptedOnError => "accepted_on_error",
});

str_enum!(QualityMetric {
    Blur => "blur",
    Darkness => "darkness",
    Sharpness => "sharpness",
});

str_enum!(CaptureStatus {
    Passed => "passed",
    Failed => "failed",
    NeedsCoverage => "needs_coverage",
});

str_enum!(ReasonCode {
    Scuff => "scuff",
    Stain => "stain",
    Hole => "hole",
    Crack => "crack",
    Discoloration => "discoloration",
    MissingItem => "missing_item",
    AddedItem => "added_item",
    Wear => "wear",
    Other => "other",
});

impl ReasonCode {
    pub const ALL: [ReasonCode; 9] = [
        Self::Scuff,
        Self::Stain,
        Self::Hole,
        Self::Crack,
        Self::Discoloration,
        Self::MissingItem,
        Self::AddedItem,
        Self::Wear,
        Self::Other,
    ];

    /// Map free model output onto the closed vocabulary. Unknown codes become `Other`.
    pub fn from_model(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase().replace([' ', '-'], "_");
        normalized.parse().unwrap_or(Self::Other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_wire_names() {
        assert_eq!(ModelVerdict::AcceptedNoModel.as_str(), "accepted_no_llm");
        let json = serde_json::to_string(&ModelVerdict::AcceptedNoModel).unwrap();
        assert_eq!(json, "\"accepted_no_llm\"");
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            QualityStatus::Pending,
            QualityStatus::Accepted,
            QualityStatus::Rejected,
            QualityStatus::Borderline,
        ] {
            assert_eq!(status.as_str().parse::<QualityStatus>().unwrap(), status);
        }
    }

    #[test]
    fn invalid_enum_value_errors() {
        let err = "maybe".parse::<GateStatus>().unwrap_err();
        assert!(err.to_string().contains("GateStatus"));
    }

    #[test]
    fn reason_code_from_model_normalizes() {
        assert_eq!(ReasonCode::from_model("Stain"), ReasonCode::Stain);
        assert_eq!(ReasonCode::from_model(" missing item "), ReasonCode::MissingItem);
        assert_eq!(ReasonCode::from_model("added-item"), ReasonCode::AddedItem);
    }

    #[test]
    fn reason_code_unknown_maps_to_other() {
        assert_eq!(ReasonCode::from_model("water damage"), ReasonCode::Other);
        assert_eq!(ReasonCode::from_model(""), ReasonCode::Other);
    }

    #[test]
    fn capture_status_serializes_snake_case() {
        let json = serde_json::to_string(&CaptureStatus::NeedsCoverage).unwrap();
        assert_eq!(json, "\"needs_coverage\"");
    }
}
