use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::user::SessionUser;

/// Lifetime of a fabricated demo session: 30 days.
pub const DEMO_SESSION_TTL_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// Resolved authentication result for one request.
///
/// `user` and `expires` are either both set or both empty, so the fields stay
/// private and the constructors are the only way in. The empty value is the
/// canonical "not signed in" answer and serialises as
/// `{"user": null, "expires": null}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSession")]
pub struct Session {
    user: Option<SessionUser>,
    #[serde(with = "iso_millis")]
    expires: Option<DateTime<Utc>>,
}

impl Session {
    pub fn authenticated(user: SessionUser, expires: DateTime<Utc>) -> Self {
        Self {
            user: Some(user),
            expires: Some(expires),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            user: None,
            expires: None,
        }
    }

    /// Demo identity valid for 30 days from `now`.
    pub fn demo(now: DateTime<Utc>) -> Self {
        Self::authenticated(
            SessionUser::demo(),
            now + Duration::milliseconds(DEMO_SESSION_TTL_MS),
        )
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.expires
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// An anonymous session never expires; an authenticated one does once
    /// `now` reaches `expires`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.map(|expires| expires <= now).unwrap_or(false)
    }
}

#[derive(Deserialize)]
struct RawSession {
    #[serde(default)]
    user: Option<SessionUser>,
    #[serde(default, with = "iso_millis")]
    expires: Option<DateTime<Utc>>,
}

impl TryFrom<RawSession> for Session {
    type Error = String;

    fn try_from(raw: RawSession) -> Result<Self, Self::Error> {
        match (raw.user, raw.expires) {
            (Some(user), Some(expires)) => Ok(Session::authenticated(user, expires)),
            (None, None) => Ok(Session::anonymous()),
            (Some(_), None) => Err("session has a user but no expiry".into()),
            (None, Some(_)) => Err("session has an expiry but no user".into()),
        }
    }
}

/// RFC 3339 with millisecond precision and a `Z` suffix.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<DateTime<Utc>>::deserialize(deserializer)
    }
}
