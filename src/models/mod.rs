// Domain entities shared by the store, the policy layer and the handlers.
//
// Wire format follows what the web client consumes: camelCase fields and
// `_id` for identifiers.

use thiserror::Error;

/// Declares a fieldless enum whose variants have a fixed wire/storage spelling.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::models::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err($crate::models::UnknownVariant {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

pub mod application;
pub mod company;
pub mod job;
pub mod profile;
pub mod user;

pub use application::{Actor, Application, ApplicationStatus, Note, ResumeFile, TimelineEntry};
pub use company::{Company, CompanySummary, TeamMember, TeamRole};
pub use job::{ExperienceLevel, Job, JobStatus, JobType};
pub use profile::{Education, Experience, JobSeekerProfile};
pub use user::{User, UserRole};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_enums_parse_case_insensitively() {
        assert_eq!("Full-Time".parse::<JobType>(), Ok(JobType::FullTime));
        assert_eq!(" HR ".parse::<TeamRole>(), Ok(TeamRole::Hr));
        let err = "ceo".parse::<TeamRole>().unwrap_err();
        assert_eq!(err.to_string(), "unknown TeamRole value 'ceo'");
    }

    #[test]
    fn string_enums_serialize_with_wire_names() {
        assert_eq!(serde_json::to_value(JobType::PartTime).unwrap(), "part-time");
        assert_eq!(
            serde_json::to_value(ApplicationStatus::Shortlisted).unwrap(),
            "shortlisted"
        );
        let parsed: ExperienceLevel = serde_json::from_str("\"senior\"").unwrap();
        assert_eq!(parsed, ExperienceLevel::Senior);
    }
}
