/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Four fixed seed values.
///
/// These never change, so every table generated from this PRNG is identical
/// across runs and across compilations.
const SEEDS: [u64; 4] = [
    0x9c5ab3cebfd55a71,
    0x06ba25379dd8975d,
    0x8015b5e59cc275e9,
    0xf8f427f15411de53,
];

/// A pseudo-random number generator using the "xoshiro" algorithm.
///
/// Usable in `const` contexts, which is how the Zobrist key table is built
/// at compile time.
pub struct XoShiRo([u64; 4]);

impl XoShiRo {
    /// Construct a new generator from the library's fixed seeds.
    #[inline(always)]
    pub const fn new() -> Self {
        Self(SEEDS)
    }

    /// Returns the next pseudo-random number along with the advanced generator.
    #[inline(always)]
    pub const fn next_const(self) -> (u64, Self) {
        let (result, s) = Self::xoshiro(self.0);
        (result, Self(s))
    }

    /// Inner function for computing the next pseudo-random number in the sequence.
    const fn xoshiro(mut s: [u64; 4]) -> (u64, [u64; 4]) {
        let result = s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);

        let t = s[1] << 17;

        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];

        s[2] ^= t;

        s[3] = s[3].rotate_left(45);
        (result, s)
    }
}

impl Default for XoShiRo {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}
