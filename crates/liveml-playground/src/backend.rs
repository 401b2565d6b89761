//! Evaluation backends.

use std::cell::RefCell;
use std::rc::Rc;

use liveml_eval::{Session, SessionError, UnitOutput};
use liveml_types::Syntax;

/// Something that runs canonical snippets against a persistent session.
///
/// `display` is the syntax values are printed in, normally the syntax the
/// snippet was written in.
pub trait Evaluate {
    fn execute(&mut self, canonical: &str, display: Syntax)
        -> Result<Vec<UnitOutput>, SessionError>;

    fn reset(&mut self) -> Result<(), SessionError>;
}

impl Evaluate for Session {
    fn execute(
        &mut self,
        canonical: &str,
        display: Syntax,
    ) -> Result<Vec<UnitOutput>, SessionError> {
        self.execute_as(canonical, display)
    }

    fn reset(&mut self) -> Result<(), SessionError> {
        Session::reset(self)
    }
}

/// One session shared by several playgrounds on the same page, so that
/// later snippets see the bindings of earlier ones.
impl<E: Evaluate> Evaluate for Rc<RefCell<E>> {
    fn execute(
        &mut self,
        canonical: &str,
        display: Syntax,
    ) -> Result<Vec<UnitOutput>, SessionError> {
        self.borrow_mut().execute(canonical, display)
    }

    fn reset(&mut self) -> Result<(), SessionError> {
        self.borrow_mut().reset()
    }
}
