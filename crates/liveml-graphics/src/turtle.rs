//! Turtle paths.
//!
//! A turtle walks from the origin facing +x. `Forward` draws a line,
//! `Turn` changes heading, and `Branch` runs a sub-program and then lifts
//! the pen back to where the branch started, so sibling branches fan out
//! from the same point.

use serde::{Deserialize, Serialize};

use crate::image::{Image, PathSegment, Point};
use crate::polar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    Forward(f64),
    /// Degrees, clockwise on screen.
    Turn(f64),
    Branch(Vec<Instruction>),
    NoOp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct State {
    position: Point,
    heading: f64,
}

struct Frame<'a> {
    instructions: std::slice::Iter<'a, Instruction>,
    /// State to restore when this frame finishes; `None` for the trunk.
    resume: Option<State>,
}

/// Run a turtle program, producing `OpenPath([MoveTo(0,0), ...])`.
///
/// Branches are tracked on an explicit stack, so nesting depth is not
/// limited by the native stack.
pub fn run(program: &[Instruction]) -> Image {
    let mut state = State {
        position: (0.0, 0.0),
        heading: 0.0,
    };
    let mut segments = vec![PathSegment::MoveTo(state.position)];
    let mut stack = vec![Frame {
        instructions: program.iter(),
        resume: None,
    }];

    loop {
        let next = match stack.last_mut() {
            Some(frame) => frame.instructions.next(),
            None => break,
        };
        match next {
            Some(Instruction::Forward(distance)) => {
                let (dx, dy) = polar(*distance, state.heading);
                state.position = (state.position.0 + dx, state.position.1 + dy);
                segments.push(PathSegment::LineTo(state.position));
            }
            Some(Instruction::Turn(degrees)) => state.heading += degrees,
            Some(Instruction::Branch(body)) => stack.push(Frame {
                instructions: body.iter(),
                resume: Some(state),
            }),
            Some(Instruction::NoOp) => {}
            None => {
                if let Some(saved) = stack.pop().and_then(|frame| frame.resume) {
                    state = saved;
                    segments.push(PathSegment::MoveTo(saved.position));
                }
            }
        }
    }

    Image::OpenPath(segments)
}
