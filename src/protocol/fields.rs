/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Field splitting and validation shared by the command and event codecs.

use super::constants::{BUY_ORDER, DELIMITER, SELL_ORDER, strip_line_ending};
use super::error::ProtocolError;
use crate::order::Side;
use std::str::FromStr;

/// Splits a line into its tag and the remaining fields.
pub(crate) fn split(line: &str) -> Result<(&str, Vec<&str>), ProtocolError> {
    let line = strip_line_ending(line);
    if line.is_empty() {
        return Err(ProtocolError::Empty);
    }
    let mut parts = line.split(DELIMITER);
    let tag = parts.next().unwrap_or_default();
    Ok((tag, parts.collect()))
}

/// Checks that a message carries exactly `expected` fields after its tag.
pub(crate) fn expect_fields(
    tag: &'static str,
    fields: &[&str],
    expected: usize,
) -> Result<(), ProtocolError> {
    if fields.len() == expected {
        Ok(())
    } else {
        Err(ProtocolError::FieldCount {
            tag,
            expected: expected + 1,
            found: fields.len() + 1,
        })
    }
}

pub(crate) fn non_empty(
    tag: &'static str,
    field: &'static str,
    value: &str,
) -> Result<String, ProtocolError> {
    if value.is_empty() {
        Err(ProtocolError::EmptyField { tag, field })
    } else if value.contains(['\r', '\n']) {
        Err(ProtocolError::LineBreak { tag, field })
    } else {
        Ok(value.to_string())
    }
}

pub(crate) fn integer<T: FromStr>(field: &'static str, value: &str) -> Result<T, ProtocolError> {
    value.parse().map_err(|_| ProtocolError::InvalidInteger {
        field,
        value: value.to_string(),
    })
}

#[must_use]
pub(crate) fn side_token(side: Side) -> &'static str {
    match side {
        Side::Buy => BUY_ORDER,
        Side::Sell => SELL_ORDER,
    }
}

pub(crate) fn parse_side(value: &str) -> Result<Side, ProtocolError> {
    match value {
        BUY_ORDER => Ok(Side::Buy),
        SELL_ORDER => Ok(Side::Sell),
        other => Err(ProtocolError::InvalidSide(other.to_string())),
    }
}
