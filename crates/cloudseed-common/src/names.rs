//! Validated resource identifiers
//!
//! Each newtype enforces the provider's naming rules when it is parsed, so a
//! bad name is reported as a [`ValidationError`] instead of a wasted request.

use crate::defaults::DEFAULT_REGION;
use crate::error::ValidationError;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

const PRINCIPAL_NAME_MAX: usize = 64;
const POLICY_NAME_MAX: usize = 128;
const BUCKET_NAME_MIN: usize = 3;
const BUCKET_NAME_MAX: usize = 63;

/// Declares a string newtype whose only constructor runs `$validate`.
macro_rules! validated_name {
    ($(#[$meta:meta])* $name:ident, $validate:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap `value`
            pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                $validate(&value)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }
    };
}

validated_name!(
    /// IAM user name: 1-64 characters of `[A-Za-z0-9+=,.@_-]`
    PrincipalName,
    validate_principal_name
);

validated_name!(
    /// Inline policy name: 1-128 characters of `[A-Za-z0-9+=,.@_-]`
    PolicyName,
    validate_policy_name
);

validated_name!(
    /// Managed policy ARN, `arn:<partition>:iam::<account>:policy/<path/name>`
    ManagedPolicyArn,
    validate_managed_policy_arn
);

validated_name!(
    /// S3 bucket name following the general purpose bucket rules
    BucketName,
    validate_bucket_name
);

validated_name!(
    /// Provider region code such as `us-east-1`
    Region,
    validate_region
);

impl Region {
    /// Whether this is the provider's default region.
    ///
    /// Bucket creation requests in the default region must not carry a
    /// location constraint; every other region requires one.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_REGION
    }
}

impl Default for Region {
    fn default() -> Self {
        Self(DEFAULT_REGION.to_string())
    }
}

fn is_iam_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '=' | ',' | '.' | '@' | '_' | '-')
}

fn check_length(kind: &'static str, value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len == 0 {
        return Err(ValidationError::Empty { kind });
    }
    if len < min {
        return Err(ValidationError::TooShort { kind, min, len });
    }
    if len > max {
        return Err(ValidationError::TooLong { kind, max, len });
    }
    Ok(())
}

fn check_chars(
    kind: &'static str,
    value: &str,
    allowed: impl Fn(char) -> bool,
) -> Result<(), ValidationError> {
    match value.chars().find(|c| !allowed(*c)) {
        Some(found) => Err(ValidationError::InvalidChar {
            kind,
            value: value.to_string(),
            found,
        }),
        None => Ok(()),
    }
}

fn malformed(kind: &'static str, value: &str, reason: &'static str) -> ValidationError {
    ValidationError::Malformed {
        kind,
        value: value.to_string(),
        reason,
    }
}

fn validate_principal_name(value: &str) -> Result<(), ValidationError> {
    const KIND: &str = "principal name";
    check_length(KIND, value, 1, PRINCIPAL_NAME_MAX)?;
    check_chars(KIND, value, is_iam_name_char)
}

fn validate_policy_name(value: &str) -> Result<(), ValidationError> {
    const KIND: &str = "policy name";
    check_length(KIND, value, 1, POLICY_NAME_MAX)?;
    check_chars(KIND, value, is_iam_name_char)
}

fn validate_managed_policy_arn(value: &str) -> Result<(), ValidationError> {
    const KIND: &str = "managed policy ARN";
    if value.is_empty() {
        return Err(ValidationError::Empty { kind: KIND });
    }
    check_chars(KIND, value, |c| c.is_ascii_graphic())?;

    let parts: Vec<&str> = value.splitn(6, ':').collect();
    let [prefix, partition, service, region, account, resource] = parts.as_slice() else {
        return Err(malformed(KIND, value, "expected six ':'-separated fields"));
    };
    if *prefix != "arn" {
        return Err(malformed(KIND, value, "must start with 'arn:'"));
    }
    if partition.is_empty() {
        return Err(malformed(KIND, value, "partition is empty"));
    }
    if *service != "iam" {
        return Err(malformed(KIND, value, "service must be 'iam'"));
    }
    if !region.is_empty() {
        return Err(malformed(KIND, value, "IAM ARNs carry no region"));
    }
    if !(*account == "aws" || (account.len() == 12 && account.chars().all(|c| c.is_ascii_digit())))
    {
        return Err(malformed(KIND, value, "account must be 'aws' or a 12-digit id"));
    }
    match resource.strip_prefix("policy/") {
        Some(path) if !path.is_empty() && !path.ends_with('/') => Ok(()),
        _ => Err(malformed(KIND, value, "resource must be 'policy/<name>'")),
    }
}

fn validate_bucket_name(value: &str) -> Result<(), ValidationError> {
    const KIND: &str = "bucket name";
    check_length(KIND, value, BUCKET_NAME_MIN, BUCKET_NAME_MAX)?;
    check_chars(KIND, value, |c| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-'
    })?;

    let edges_ok = value
        .chars()
        .next()
        .zip(value.chars().last())
        .is_some_and(|(first, last)| first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric());
    if !edges_ok {
        return Err(malformed(KIND, value, "must start and end with a letter or digit"));
    }
    if value.contains("..") {
        return Err(malformed(KIND, value, "consecutive dots are not allowed"));
    }
    if value.parse::<Ipv4Addr>().is_ok() {
        return Err(malformed(KIND, value, "must not be formatted as an IP address"));
    }
    if value.starts_with("xn--") {
        return Err(malformed(KIND, value, "the 'xn--' prefix is reserved"));
    }
    if value.ends_with("-s3alias") {
        return Err(malformed(KIND, value, "the '-s3alias' suffix is reserved"));
    }
    Ok(())
}

fn validate_region(value: &str) -> Result<(), ValidationError> {
    const KIND: &str = "region";
    if value.is_empty() {
        return Err(ValidationError::Empty { kind: KIND });
    }
    check_chars(KIND, value, |c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')?;
    if !value.contains('-') || value.starts_with('-') || value.ends_with('-') {
        return Err(malformed(KIND, value, "expected a region code such as 'eu-west-1'"));
    }
    Ok(())
}
