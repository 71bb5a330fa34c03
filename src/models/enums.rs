use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(NutrientStatus {
    Good => "good",
    Warning => "warning",
    Critical => "critical",
});

str_enum!(NutrientGroup {
    Primary => "primary",
    Secondary => "secondary",
    Trace => "trace",
    Physical => "physical",
});

impl NutrientGroup {
    pub const ALL: [NutrientGroup; 4] = [
        NutrientGroup::Primary,
        NutrientGroup::Secondary,
        NutrientGroup::Trace,
        NutrientGroup::Physical,
    ];

    /// Section heading used in reports.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Primary => "Primary Nutrients",
            Self::Secondary => "Secondary Nutrients",
            Self::Trace => "Trace Elements",
            Self::Physical => "Physical Properties",
        }
    }
}
