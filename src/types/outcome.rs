// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;

/// The answer given for a card during review.
#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Forgot,
    Struggled,
    Remembered,
}

impl Outcome {
    /// Only a forgotten card counts as a failed review.
    pub fn is_success(self) -> bool {
        !matches!(self, Outcome::Forgot)
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Forgot => write!(f, "forgot"),
            Outcome::Struggled => write!(f, "struggled"),
            Outcome::Remembered => write!(f, "remembered"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success() {
        assert!(!Outcome::Forgot.is_success());
        assert!(Outcome::Struggled.is_success());
        assert!(Outcome::Remembered.is_success());
    }
}
