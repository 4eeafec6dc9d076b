// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC GlobalId generation
//!
//! A GlobalId is a 128-bit UUID written as 22 characters of the IFC base-64
//! alphabet: the first character carries the top 2 bits, the remaining 21
//! carry 6 bits each.

use uuid::Uuid;

const ALPHABET: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_$";

/// Generate a fresh random GlobalId
pub fn new_global_id() -> String {
    compress_guid(Uuid::new_v4().as_u128())
}

/// Compress a 128-bit value into the 22-character IFC form
pub fn compress_guid(value: u128) -> String {
    let mut out = String::with_capacity(22);
    out.push(ALPHABET[(value >> 126) as usize] as char);
    for i in (0..21).rev() {
        out.push(ALPHABET[((value >> (i * 6)) & 0x3f) as usize] as char);
    }
    out
}
