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

use crate::cmd::resolve_folder;
use crate::config::StoreConfig;
use crate::error::Fallible;
use crate::history::loader::load_history;

/// Read every review log of a folder without opening it for writing.
pub async fn check_folder(config: StoreConfig, directory: Option<String>) -> Fallible<()> {
    let folder = resolve_folder(directory)?;
    let index = load_history(&config, &config.log_dir_of(&folder)).await?;
    log::debug!("{} cards have review history.", index.len());
    println!("ok");
    Ok(())
}
