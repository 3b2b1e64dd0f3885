/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

// Add-ons for browserui.
//
// Native add-ons are compiled in and own their lifecycle hooks.

pub mod native;
