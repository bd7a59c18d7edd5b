//! `address` / `addr`: addresses of symbols or of input objects

use crate::backend::{Object, Program};
use crate::pipeline::error::PipelineResult;
use crate::pipeline::registry::Registry;
use crate::pipeline::session::Session;
use crate::pipeline::stage::{ObjectStream, Stage};
use std::sync::Arc;

const HELP: &str = "syntax: address [<symbol>|<hex address> ...]

With arguments, emits the address of each symbol, or a 'void *' for each
hexadecimal number. Without arguments, emits the address of every input
object.";

pub fn register(registry: &mut Registry) {
    registry.register_command(&["address", "addr"], HELP, Address::construct);
}

fn parse_hex(arg: &str) -> Option<u64> {
    let digits = arg
        .strip_prefix("0x")
        .or_else(|| arg.strip_prefix("0X"))
        .unwrap_or(arg);
    u64::from_str_radix(digits, 16).ok()
}

pub struct Address {
    program: Arc<Program>,
    args: Vec<String>,
}

impl Address {
    pub fn construct(session: &Session, args: &str) -> PipelineResult<Box<dyn Stage>> {
        Ok(Box::new(Self {
            program: Arc::clone(session.program()),
            args: args.split_whitespace().map(str::to_string).collect(),
        }))
    }

    fn resolve(&self, arg: &str) -> PipelineResult<Object> {
        match parse_hex(arg) {
            Some(address) => Ok(Object::void_pointer(&self.program, address)),
            None => Ok(self.program.object(arg)?.address_of()?),
        }
    }
}

impl Stage for Address {
    fn name(&self) -> &str {
        "address"
    }

    fn call<'a>(&'a self, input: ObjectStream<'a>) -> ObjectStream<'a> {
        if self.args.is_empty() {
            Box::new(input.map(|res| res.and_then(|obj| Ok(obj.address_of()?))))
        } else {
            Box::new(self.args.iter().map(move |arg| self.resolve(arg)))
        }
    }
}
