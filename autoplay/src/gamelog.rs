use std::{fs, io, path::Path};

use minegrid::snapshot::BoardLayouts;

/// One more than the highest `game_<agent>_<n>.bin` already present, or `1` on a fresh directory.
pub fn next_game_number(dir: &Path, agent: &str) -> io::Result<usize> {
    let prefix = format!("game_{agent}_");
    let mut highest = 0;
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(number) = name
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(".bin"))
            .and_then(|digits| digits.parse::<usize>().ok())
        {
            highest = highest.max(number);
        }
    }
    Ok(highest + 1)
}

/// Serializes the finished game's layouts into `dir/game_<agent>_<number>.bin`.
pub fn save_layouts(
    dir: &Path,
    agent: &str,
    number: usize,
    layouts: &BoardLayouts,
) -> io::Result<()> {
    let bytes = bcs::to_bytes(layouts)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    fs::write(dir.join(format!("game_{agent}_{number}.bin")), bytes)
}
