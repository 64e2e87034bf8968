// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inspection-path record parser using nom
//!
//! Accepts exactly the dict-literal subset the inspection path files use:
//! quoted keys, numeric values, optional trailing comma.

use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, digit0, digit1, none_of, one_of},
    combinator::{all_consuming, map, map_res, opt, recognize},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, separated_pair, terminated, tuple},
    IResult,
};

use crate::error::{Error, Result};
use crate::pose::CameraPose;

/// Keys every record must carry, in location-then-rotation order
const POSE_KEYS: [&str; 6] = ["X", "Y", "Z", "A", "B", "C"];

/// Skip whitespace
fn ws(input: &str) -> IResult<&str, ()> {
    map(take_while(|c: char| c.is_whitespace()), |_| ())(input)
}

/// Parse a quoted key: 'X' or "X"
fn key(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('\''), recognize(many0(none_of("'"))), char('\'')),
        delimited(char('"'), recognize(many0(none_of("\""))), char('"')),
    ))(input)
}

/// Parse a number: 3, -3.14, .5, 2., 1.5e-10
fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            alt((
                recognize(pair(digit1, opt(pair(char('.'), digit0)))),
                recognize(pair(char('.'), digit1)),
            )),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

/// Parse `'K': value`
fn entry(input: &str) -> IResult<&str, (&str, f64)> {
    separated_pair(
        delimited(ws, key, ws),
        char(':'),
        delimited(ws, number, ws),
    )(input)
}

/// Parse a whole `{...}` record into its key/value pairs
fn record(input: &str) -> IResult<&str, Vec<(&str, f64)>> {
    all_consuming(delimited(
        pair(ws, char('{')),
        terminated(
            separated_list1(char(','), entry),
            opt(pair(char(','), ws)),
        ),
        pair(char('}'), ws),
    ))(input)
}

/// Parse one inspection-path line into a camera pose.
///
/// `line_no` is 1-based and only used for error reporting. Unknown,
/// duplicate or missing keys are rejected.
pub fn parse_pose_record(input: &str, line_no: usize) -> Result<CameraPose> {
    let (_, entries) = record(input)
        .map_err(|e| Error::parse(line_no, format!("Malformed pose record: {}", e)))?;

    let mut values: [Option<f64>; 6] = [None; 6];
    for (name, value) in entries {
        let slot = POSE_KEYS
            .iter()
            .position(|k| *k == name)
            .ok_or_else(|| Error::parse(line_no, format!("Unknown key '{}'", name)))?;
        if values[slot].replace(value).is_some() {
            return Err(Error::parse(line_no, format!("Duplicate key '{}'", name)));
        }
    }

    let mut resolved = [0.0; 6];
    for (slot, value) in values.iter().enumerate() {
        resolved[slot] = value.ok_or_else(|| {
            Error::parse(line_no, format!("Missing key '{}'", POSE_KEYS[slot]))
        })?;
    }

    Ok(CameraPose {
        location: [resolved[0], resolved[1], resolved[2]],
        rotation: [resolved[3], resolved[4], resolved[5]],
    })
}
