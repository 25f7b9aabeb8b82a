//! Single-letter choice codes
//!
//! Most enumerations in the marketplace (property type, group status,
//! reviewee role...) travel as one-letter codes both on the wire and in the
//! database. `define_code_enum!` generates the enum together with its serde
//! renames, `code()`, `Display` and `FromStr`.

use thiserror::Error;

/// A code that does not name any variant of the target enum
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind} code: {code}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: String,
}

#[macro_export]
macro_rules! define_code_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $( $(#[$vmeta:meta])* $variant:ident => $code:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Code stored in the database and sent over the wire
            pub fn code(&self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.code())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::codes::UnknownCode;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok($name::$variant),)+
                    other => Err($crate::codes::UnknownCode {
                        kind: stringify!($name),
                        code: other.to_string(),
                    }),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    define_code_enum!(
        /// Test enum
        Flavour { Sweet => "S", Bitter => "B" }
    );

    #[test]
    fn test_round_trips_codes() {
        for flavour in Flavour::ALL {
            assert_eq!(flavour.code().parse::<Flavour>().unwrap(), *flavour);
        }
    }

    #[test]
    fn test_unknown_code() {
        let err = "Z".parse::<Flavour>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown Flavour code: Z");
    }

    #[test]
    fn test_serde_uses_code() {
        assert_eq!(serde_json::to_string(&Flavour::Bitter).unwrap(), "\"B\"");
        let parsed: Flavour = serde_json::from_str("\"S\"").unwrap();
        assert_eq!(parsed, Flavour::Sweet);
    }
}
