// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document scanning — perspective crop of the detected page and the
// enhancement filters applied to the cropped result.

pub mod clahe;
pub mod crop;
pub mod enhance;
pub mod lab;

pub use crop::{crop, crop_size, normalize_quad};
pub use enhance::DocumentEnhancer;
