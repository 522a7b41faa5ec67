//! Line-oriented map editing, queued and applied between frames.
//!
//! ```text
//! w x y z r g b   write one voxel
//! s path          save the map
//! q               end the editing session
//! ```

use std::collections::VecDeque;
use std::path::PathBuf;
use std::str::FromStr;

use crate::color::Rgb;
use crate::error::{CommandError, WorldError};
use crate::world::WorldGrid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    Write {
        x: usize,
        y: usize,
        z: usize,
        color: Rgb,
    },
    Save {
        path: PathBuf,
    },
    Quit,
}

/// Result of applying one queued command.
#[derive(Debug, PartialEq, Eq)]
pub enum EditOutcome {
    Written { x: usize, y: usize, z: usize },
    Rejected(WorldError),
    /// The map as it stood when the command was reached. Writing it out is the caller's job.
    Save { path: PathBuf, bytes: Vec<u8> },
    SessionEnded,
}

pub fn parse_command(line: &str) -> Result<EditCommand, CommandError> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb {
        "" => Err(CommandError::Empty),
        "w" => {
            let args: Vec<&str> = rest.split_whitespace().collect();
            if args.len() != 6 {
                return Err(CommandError::ArgumentCount {
                    verb: "w",
                    expected: 6,
                    actual: args.len(),
                });
            }
            Ok(EditCommand::Write {
                x: number(args[0])?,
                y: number(args[1])?,
                z: number(args[2])?,
                color: Rgb::new(number(args[3])?, number(args[4])?, number(args[5])?),
            })
        }
        "s" => {
            if rest.is_empty() {
                return Err(CommandError::ArgumentCount {
                    verb: "s",
                    expected: 1,
                    actual: 0,
                });
            }
            Ok(EditCommand::Save {
                path: PathBuf::from(rest),
            })
        }
        "q" => {
            let extra = rest.split_whitespace().count();
            if extra != 0 {
                return Err(CommandError::ArgumentCount {
                    verb: "q",
                    expected: 0,
                    actual: extra,
                });
            }
            Ok(EditCommand::Quit)
        }
        other => Err(CommandError::UnknownVerb(other.to_string())),
    }
}

fn number<T: FromStr>(arg: &str) -> Result<T, CommandError> {
    arg.parse()
        .map_err(|_| CommandError::InvalidNumber(arg.to_string()))
}

/// Commands waiting for the next gap between frames.
#[derive(Debug, Default)]
pub struct EditQueue {
    pending: VecDeque<EditCommand>,
}

impl EditQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: EditCommand) {
        self.pending.push_back(command);
    }

    /// Parses and queues one editor line. Malformed lines are returned and not queued.
    pub fn push_line(&mut self, line: &str) -> Result<(), CommandError> {
        let command = parse_command(line)?;
        self.push(command);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Applies every pending command in order, then re-encodes the grid if anything changed.
    pub fn drain(&mut self, grid: &mut WorldGrid) -> Vec<EditOutcome> {
        let mut outcomes = Vec::with_capacity(self.pending.len());
        for command in self.pending.drain(..) {
            let outcome = match command {
                EditCommand::Write { x, y, z, color } => match grid.write(x, y, z, color) {
                    Ok(()) => EditOutcome::Written { x, y, z },
                    Err(err) => EditOutcome::Rejected(err),
                },
                EditCommand::Save { path } => EditOutcome::Save {
                    path,
                    bytes: grid.to_bytes(),
                },
                EditCommand::Quit => EditOutcome::SessionEnded,
            };
            outcomes.push(outcome);
        }

        if !grid.is_encoded() {
            grid.encode();
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::GridDims;

    #[test]
    fn parses_write() {
        assert_eq!(
            parse_command("w 1 2 3 255 0 17"),
            Ok(EditCommand::Write {
                x: 1,
                y: 2,
                z: 3,
                color: Rgb::new(255, 0, 17)
            })
        );
    }

    #[test]
    fn parses_save_with_spaces_in_path() {
        assert_eq!(
            parse_command("s  maps/my room.vox "),
            Ok(EditCommand::Save {
                path: PathBuf::from("maps/my room.vox")
            })
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(parse_command("   "), Err(CommandError::Empty));
        assert_eq!(
            parse_command("x 1"),
            Err(CommandError::UnknownVerb("x".into()))
        );
        assert_eq!(
            parse_command("w 1 2 3"),
            Err(CommandError::ArgumentCount {
                verb: "w",
                expected: 6,
                actual: 3
            })
        );
        assert_eq!(
            parse_command("w 1 2 3 256 0 0"),
            Err(CommandError::InvalidNumber("256".into()))
        );
        assert_eq!(
            parse_command("w -1 2 3 0 0 0"),
            Err(CommandError::InvalidNumber("-1".into()))
        );
        assert!(parse_command("s").is_err());
        assert!(parse_command("q now").is_err());
    }

    #[test]
    fn drain_applies_in_order_and_reencodes() {
        let mut grid = WorldGrid::empty(GridDims::new(2, 2, 3));
        let mut queue = EditQueue::new();
        queue.push_line("w 0 1 1 9 9 9").unwrap();
        queue.push_line("s out.vox").unwrap();
        queue.push_line("w 5 0 0 1 1 1").unwrap();
        queue.push_line("q").unwrap();
        assert!(queue.push_line("w nope").is_err());
        assert_eq!(queue.len(), 4);

        let outcomes = queue.drain(&mut grid);
        assert!(queue.is_empty());
        assert!(grid.is_encoded());
        assert_eq!(outcomes[0], EditOutcome::Written { x: 0, y: 1, z: 1 });
        match &outcomes[1] {
            EditOutcome::Save { path, bytes } => {
                assert_eq!(path, &PathBuf::from("out.vox"));
                let idx = grid.dims().index(0, 1, 1) * 3;
                assert_eq!(&bytes[idx..idx + 3], &[9, 9, 9]);
            }
            other => panic!("expected a save, got {other:?}"),
        }
        assert_eq!(
            outcomes[2],
            EditOutcome::Rejected(WorldError::OutOfBounds { x: 5, y: 0, z: 0 })
        );
        assert_eq!(outcomes[3], EditOutcome::SessionEnded);
        assert_eq!(grid.voxel(0, 1, 1), Some(Rgb::new(9, 9, 9)));
    }
}
