// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`World`] trait definition.

use std::{fmt::Display, future::Future};

/// Host-defined state living on a per-scenario basis.
///
/// This is where the real step executor lives: step implementations receive
/// a fresh `&mut World` per scenario and drive whatever external system
/// (browser, HTTP client, database) the host wires in. This crate never
/// touches that system itself.
///
/// No out-of-the-box way of sharing state across scenarios is provided, on
/// purpose: scenarios depending on each other is exactly what the exclusive
/// lock exists to make explicit instead.
pub trait World: Sized + 'static {
    /// Error of creating a new [`World`] instance.
    type Error: Display;

    /// Creates a new [`World`] instance.
    ///
    /// # Errors
    ///
    /// If the instance cannot be created; the scenario fails without running
    /// any steps.
    fn new() -> impl Future<Output = Result<Self, Self::Error>>;
}
