// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub const DISPLAY_PLACEHOLDER: &str = "YYYY-MM-DD HH:mm";

const DISPLAY_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");
const DATETIME_LOCAL_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]");
const OFFSET_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[offset_hour sign:mandatory]:[offset_minute]");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayZone {
    offset: UtcOffset,
}

impl Default for DisplayZone {
    fn default() -> Self {
        Self::UTC
    }
}

impl DisplayZone {
    pub const UTC: Self = Self {
        offset: UtcOffset::UTC,
    };

    pub const fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }

    /// Falls back to UTC when the platform cannot report a sound local offset.
    pub fn local() -> Self {
        UtcOffset::current_local_offset()
            .map(Self::new)
            .unwrap_or(Self::UTC)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
            return Ok(Self::UTC);
        }
        match UtcOffset::parse(trimmed, OFFSET_FORMAT) {
            Ok(offset) => Ok(Self::new(offset)),
            Err(_) => bail!("invalid UTC offset {raw:?} -- use +HH:MM, -HH:MM, or UTC"),
        }
    }

    pub const fn offset(self) -> UtcOffset {
        self.offset
    }

    pub fn to_display(self, instant: Option<OffsetDateTime>) -> String {
        let Some(instant) = instant else {
            return String::new();
        };
        instant
            .to_offset(self.offset)
            .format(DISPLAY_FORMAT)
            .unwrap_or_default()
    }

    pub fn from_display(self, text: &str) -> Result<Option<OffsetDateTime>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let parsed = PrimitiveDateTime::parse(trimmed, DISPLAY_FORMAT)
            .or_else(|_| PrimitiveDateTime::parse(trimmed, DATETIME_LOCAL_FORMAT));
        match parsed {
            Ok(local) => Ok(Some(
                local.assume_offset(self.offset).to_offset(UtcOffset::UTC),
            )),
            Err(_) => bail!("invalid date {trimmed:?} -- use {DISPLAY_PLACEHOLDER}"),
        }
    }

    pub fn default_display(self, now: OffsetDateTime) -> String {
        self.to_display(Some(now))
    }
}

pub mod wire_option {
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(instant) => {
                let text = instant.format(&Rfc3339).map_err(S::Error::custom)?;
                serializer.serialize_some(&text)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.filter(|text| !text.trim().is_empty())
            .map(|text| OffsetDateTime::parse(text.trim(), &Rfc3339).map_err(D::Error::custom))
            .transpose()
    }
}
