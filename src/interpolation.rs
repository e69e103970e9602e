//! Interpolation schemes for moving staggered samples to cell centres.
//!
//! Along an axis with `N` cells the samples are indexed `0..=N` and the
//! centre of cell `c` lies midway between samples `c` and `c + 1`. Every
//! scheme is a fixed stencil of weights; a scheme with `ndl` points at or
//! left of the target reads samples `c + 1 - ndl ..` and is only usable
//! when that whole window lies inside `0..=N`.
//!
//! Near the ends of an axis the wide schemes no longer fit, so each call
//! site walks an ordered candidate list and takes the first scheme that
//! does. The final candidate is the two-point linear scheme, which fits
//! every cell of every axis.

use crate::arrays::FieldScalar;
use crate::geometry::InterpolationMethod;

/// Widest stencil of any scheme.
pub const MAX_STENCIL_WIDTH: usize = 8;

/// Which stencil a scheme applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemeKind {
    /// 8-point band-limited; the value is the number of points at or left
    /// of the target (1..=7).
    BandLimited(u8),
    /// 4-point cubic with the target between points 0 and 1.
    CubicFirst,
    /// 4-point cubic with the target between points 1 and 2.
    CubicMiddle,
    /// 4-point cubic with the target between points 2 and 3.
    CubicLast,
    /// 2-point midpoint average.
    Linear,
}

/// A fixed-stencil interpolation rule.
#[derive(Debug, PartialEq)]
pub struct InterpolationScheme {
    kind: SchemeKind,
    coefficients: &'static [f64],
    points_left: usize,
    priority: u8,
}

impl InterpolationScheme {
    /// Stencil kind.
    pub fn kind(&self) -> SchemeKind {
        self.kind
    }

    /// Stencil weights, first sample first.
    pub fn coefficients(&self) -> &'static [f64] {
        self.coefficients
    }

    /// Number of samples the stencil reads.
    pub fn width(&self) -> usize {
        self.coefficients.len()
    }

    /// Number of stencil points at or left of the target.
    pub fn points_left(&self) -> usize {
        self.points_left
    }

    /// Rank of the scheme; 1 is best.
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Whether this scheme is strictly preferable to `other`.
    pub fn is_better_than(&self, other: &InterpolationScheme) -> bool {
        self.priority < other.priority
    }

    /// First sample read when interpolating to the centre of `cell`.
    pub fn first_sample(&self, cell: usize) -> Option<usize> {
        (cell + 1).checked_sub(self.points_left)
    }

    /// Whether the stencil for `cell` lies inside an axis of `cells` cells.
    pub fn fits(&self, cells: usize, cell: usize) -> bool {
        cell < cells
            && self
                .first_sample(cell)
                .map_or(false, |first| first + self.width() <= cells + 1)
    }

    /// Weighted sum of `samples[offset..offset + width]`.
    ///
    /// Panics if the stencil runs past the end of `samples`.
    #[inline]
    pub fn interpolate<T: FieldScalar>(&self, samples: &[T], offset: usize) -> T {
        assert!(
            offset + self.width() <= samples.len(),
            "{:?} stencil at offset {} needs {} samples, only {} available",
            self.kind,
            offset,
            self.width(),
            samples.len()
        );
        samples[offset..offset + self.width()]
            .iter()
            .zip(self.coefficients)
            .map(|(&s, &w)| s * w)
            .sum()
    }
}

const fn scheme(
    kind: SchemeKind,
    coefficients: &'static [f64],
    points_left: usize,
    priority: u8,
) -> InterpolationScheme {
    InterpolationScheme {
        kind,
        coefficients,
        points_left,
        priority,
    }
}

/// Band-limited, one point left of the target.
pub static BAND_LIMITED_1: InterpolationScheme = scheme(
    SchemeKind::BandLimited(1),
    &[
        0.273706174084630,
        1.182369982257808,
        -0.881025392573605,
        0.773492782616592,
        -0.566544653799849,
        0.317133692295295,
        -0.122889310571621,
        0.025822185746912,
    ],
    1,
    4,
);

/// Band-limited, two points left of the target.
pub static BAND_LIMITED_2: InterpolationScheme = scheme(
    SchemeKind::BandLimited(2),
    &[
        -0.031537318940243,
        0.402867418378250,
        0.890616669238806,
        -0.430226337654209,
        0.262333382889416,
        -0.133667402749460,
        0.048780060318859,
        -0.009803559450279,
    ],
    2,
    3,
);

/// Band-limited, three points left of the target.
pub static BAND_LIMITED_3: InterpolationScheme = scheme(
    SchemeKind::BandLimited(3),
    &[
        0.011013580459860,
        -0.077197711180470,
        0.506982656968895,
        0.728365784312416,
        -0.244714332302213,
        0.103876943075246,
        -0.034506397896024,
        0.006523208087210,
    ],
    3,
    2,
);

/// Band-limited, centred.
pub static BAND_LIMITED_4: InterpolationScheme = scheme(
    SchemeKind::BandLimited(4),
    &[
        -0.006777513830539,
        0.039457774230959,
        -0.142658093428231,
        0.609836360661632,
        0.609836360661632,
        -0.142658093428231,
        0.039457774230959,
        -0.006777513830539,
    ],
    4,
    1,
);

/// Band-limited, five points left of the target.
pub static BAND_LIMITED_5: InterpolationScheme = scheme(
    SchemeKind::BandLimited(5),
    &[
        0.006523208087210,
        -0.034506397896024,
        0.103876943075246,
        -0.244714332302213,
        0.728365784312416,
        0.506982656968895,
        -0.077197711180470,
        0.011013580459860,
    ],
    5,
    2,
);

/// Band-limited, six points left of the target.
pub static BAND_LIMITED_6: InterpolationScheme = scheme(
    SchemeKind::BandLimited(6),
    &[
        -0.009803559450279,
        0.048780060318859,
        -0.133667402749460,
        0.262333382889416,
        -0.430226337654209,
        0.890616669238806,
        0.402867418378250,
        -0.031537318940243,
    ],
    6,
    3,
);

/// Band-limited, seven points left of the target.
pub static BAND_LIMITED_7: InterpolationScheme = scheme(
    SchemeKind::BandLimited(7),
    &[
        0.025822185746912,
        -0.122889310571621,
        0.317133692295295,
        -0.566544653799849,
        0.773492782616592,
        -0.881025392573605,
        1.182369982257808,
        0.273706174084630,
    ],
    7,
    4,
);

/// Cubic, target between the first two points.
pub static CUBIC_FIRST: InterpolationScheme = scheme(
    SchemeKind::CubicFirst,
    &[5.0 / 16.0, 15.0 / 16.0, -5.0 / 16.0, 1.0 / 16.0],
    1,
    6,
);

/// Cubic, centred.
pub static CUBIC_MIDDLE: InterpolationScheme = scheme(
    SchemeKind::CubicMiddle,
    &[-1.0 / 16.0, 9.0 / 16.0, 9.0 / 16.0, -1.0 / 16.0],
    2,
    5,
);

/// Cubic, target between the last two points.
pub static CUBIC_LAST: InterpolationScheme = scheme(
    SchemeKind::CubicLast,
    &[1.0 / 16.0, -5.0 / 16.0, 15.0 / 16.0, 5.0 / 16.0],
    3,
    6,
);

/// Midpoint average of two neighbours.
pub static LINEAR: InterpolationScheme = scheme(SchemeKind::Linear, &[0.5, 0.5], 1, 7);

/// Candidates in order of preference when band-limited is preferred.
pub static BAND_LIMITED_CANDIDATES: [&InterpolationScheme; 11] = [
    &BAND_LIMITED_4,
    &BAND_LIMITED_3,
    &BAND_LIMITED_5,
    &BAND_LIMITED_2,
    &BAND_LIMITED_6,
    &BAND_LIMITED_1,
    &BAND_LIMITED_7,
    &CUBIC_MIDDLE,
    &CUBIC_FIRST,
    &CUBIC_LAST,
    &LINEAR,
];

/// Candidates in order of preference when cubic is preferred.
pub static CUBIC_CANDIDATES: [&InterpolationScheme; 4] =
    [&CUBIC_MIDDLE, &CUBIC_FIRST, &CUBIC_LAST, &LINEAR];

/// Ordered candidate list for `method`.
pub fn candidates(method: InterpolationMethod) -> &'static [&'static InterpolationScheme] {
    match method {
        InterpolationMethod::BandLimited => &BAND_LIMITED_CANDIDATES,
        InterpolationMethod::Cubic => &CUBIC_CANDIDATES,
    }
}

/// Best scheme for the centre of `cell` on an axis of `cells` cells.
///
/// Panics if `cell` is not a cell of the axis.
pub fn best_scheme(
    cells: usize,
    cell: usize,
    method: InterpolationMethod,
) -> &'static InterpolationScheme {
    assert!(
        cell < cells,
        "cell {cell} is outside an axis of {cells} cells"
    );
    candidates(method)
        .iter()
        .copied()
        .find(|s| s.fits(cells, cell))
        .unwrap_or(&LINEAR)
}
