// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decoding, encoding and borrowing decoded pixels as an
// `ImageView` for the similarity scorer.

pub mod bitmap;

pub use bitmap::Bitmap;
