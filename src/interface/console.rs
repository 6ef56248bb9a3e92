// src/interface/console.rs
// Line-based request protocol served by the binary on stdin. It stands in for the
// messaging layer that delivers missions and marker positions on the real robot.
//
//   fix <row> <col>          position fix from a decoded marker
//   line <F|L|R>             latest line tracer reading
//   mission <row>,<col> ...  install a new target list (empty clears it)
//   status                   print the executor status
//   stop                     cancel the current mission
//   quit                     shut down

use std::str::FromStr;

use super::{LineDirection, PositionFix};
use crate::AgvError;
use crate::core::Cell;

/// One parsed console line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsoleRequest {
    /// `fix <row> <col>`
    Fix(PositionFix),
    /// `line <F|L|R>`
    Line(LineDirection),
    /// `mission <row>,<col> ...`
    Mission(Vec<Cell>),
    /// `status`
    Status,
    /// `stop`
    Stop,
    /// `quit`
    Quit,
}

impl FromStr for ConsoleRequest {
    type Err = AgvError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let keyword = words
            .next()
            .ok_or_else(|| AgvError::Parse("empty request".to_string()))?
            .to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        let request = match keyword.as_str() {
            "fix" => match args.as_slice() {
                [row, col] => ConsoleRequest::Fix(PositionFix {
                    cell: Cell::new(parse_index(row)?, parse_index(col)?),
                }),
                _ => return Err(AgvError::Parse("usage: fix <row> <col>".to_string())),
            },
            "line" => match args.as_slice() {
                [direction] => ConsoleRequest::Line(direction.parse().map_err(AgvError::Parse)?),
                _ => return Err(AgvError::Parse("usage: line <F|L|R>".to_string())),
            },
            "mission" => ConsoleRequest::Mission(
                args.iter()
                    .map(|pair| parse_cell(pair))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            "status" => ConsoleRequest::Status,
            "stop" => ConsoleRequest::Stop,
            "quit" | "exit" => ConsoleRequest::Quit,
            other => return Err(AgvError::Parse(format!("unknown request '{}'", other))),
        };

        if !args.is_empty()
            && matches!(
                request,
                ConsoleRequest::Status | ConsoleRequest::Stop | ConsoleRequest::Quit
            )
        {
            return Err(AgvError::Parse(format!("'{}' takes no arguments", keyword)));
        }
        Ok(request)
    }
}

/// Parses `row,col`
pub fn parse_cell(pair: &str) -> Result<Cell, AgvError> {
    let (row, col) = pair
        .split_once(',')
        .ok_or_else(|| AgvError::Parse(format!("expected <row>,<col>, got '{}'", pair)))?;
    Ok(Cell::new(parse_index(row)?, parse_index(col)?))
}

fn parse_index(text: &str) -> Result<usize, AgvError> {
    text.trim()
        .parse()
        .map_err(|_| AgvError::Parse(format!("'{}' is not a grid index", text.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_fix() {
        let request: ConsoleRequest = "fix 3 4".parse().unwrap();
        assert_eq!(request, ConsoleRequest::Fix(PositionFix::new(3, 4)));
    }

    #[test]
    fn parses_mission_with_repeats() {
        let request: ConsoleRequest = "mission 0,1 0,5 0,1".parse().unwrap();
        assert_eq!(
            request,
            ConsoleRequest::Mission(vec![Cell::new(0, 1), Cell::new(0, 5), Cell::new(0, 1)])
        );
    }

    #[test]
    fn empty_mission_is_allowed() {
        assert_eq!(
            "mission".parse::<ConsoleRequest>().unwrap(),
            ConsoleRequest::Mission(vec![])
        );
    }

    #[rstest]
    #[case("STATUS", ConsoleRequest::Status)]
    #[case("stop", ConsoleRequest::Stop)]
    #[case("exit", ConsoleRequest::Quit)]
    #[case("line l", ConsoleRequest::Line(LineDirection::Left))]
    fn parses_keywords(#[case] line: &str, #[case] expected: ConsoleRequest) {
        assert_eq!(line.parse::<ConsoleRequest>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("fix 1")]
    #[case("fix -1 2")]
    #[case("mission 1;2")]
    #[case("line up")]
    #[case("status now")]
    #[case("dance")]
    fn rejects_malformed_lines(#[case] line: &str) {
        assert!(matches!(
            line.parse::<ConsoleRequest>(),
            Err(AgvError::Parse(_))
        ));
    }
}
