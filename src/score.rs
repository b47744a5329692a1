/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

/// A numerical evaluation of a position, from the perspective of the side
/// to move.
///
/// Material dominates: one pawn of material is worth 1000 points, so the
/// positional terms (which are single or double digits) can never outweigh a
/// capture.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Score(pub i32);

impl Score {
    /// Largest possible score ever achievable.
    pub const INF: Self = Self(i32::MAX);

    /// Score of a draw.
    pub const DRAW: Self = Self(0);

    /// Any score beyond this magnitude means a forced win or loss was found.
    const DECISIVE: i32 = i32::MAX / 10 * 9;

    /// The score of having no legal move while in check, biased by the
    /// number of halfmoves played so that a quicker mate scores higher for
    /// the winner.
    #[inline(always)]
    pub const fn loss(ply: usize) -> Self {
        Self(-Self::INF.0 + 1 + ply as i32)
    }

    /// Whether this score means the side to move is winning by force.
    #[inline(always)]
    pub const fn is_winning(&self) -> bool {
        self.0 > Self::DECISIVE
    }

    /// Whether this score means the side to move is losing by force.
    #[inline(always)]
    pub const fn is_losing(&self) -> bool {
        self.0 < -Self::DECISIVE
    }

    /// Returns the larger of two scores.
    #[inline(always)]
    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }

    /// Returns the smaller of two scores.
    #[inline(always)]
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }
}

macro_rules! impl_binary_op {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$fn(rhs.0))
            }
        }

        impl std::ops::$trait<i32> for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: i32) -> Self::Output {
                Self(self.0.$fn(rhs))
            }
        }
    };
}

macro_rules! impl_binary_op_assign {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: Self) {
                self.0.$fn(rhs.0);
            }
        }

        impl std::ops::$trait<i32> for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: i32) {
                self.0.$fn(rhs);
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);

impl_binary_op_assign!(AddAssign, add_assign);
impl_binary_op_assign!(SubAssign, sub_assign);

impl std::ops::Neg for Score {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self(self.0.neg())
    }
}

impl PartialEq<i32> for Score {
    fn eq(&self, other: &i32) -> bool {
        self.0.eq(other)
    }
}

impl PartialOrd<i32> for Score {
    fn partial_cmp(&self, other: &i32) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(other)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_winning() {
            write!(f, "win")
        } else if self.is_losing() {
            write!(f, "loss")
        } else {
            self.0.fmt(f)
        }
    }
}

impl fmt::Debug for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
