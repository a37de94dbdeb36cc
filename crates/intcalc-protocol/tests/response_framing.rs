//! Behavioural tests for incremental response framing.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use intcalc_protocol::{FrameProgress, ResponseFrame, ResponseFrameReader, Status, encode_response};

#[derive(Default)]
struct FramingWorld {
    wire: Vec<u8>,
    frame: Option<ResponseFrame>,
}

impl FramingWorld {
    fn deliver(&mut self, chunk_size: usize) {
        let mut reader = ResponseFrameReader::new();
        for chunk in self.wire.chunks(chunk_size) {
            if let FrameProgress::Complete(frame) = reader.feed(chunk).expect("feed chunk") {
                self.frame = Some(frame);
                return;
            }
        }
        self.frame = Some(reader.finish());
    }

    fn frame(&self) -> &ResponseFrame {
        self.frame.as_ref().expect("response delivered")
    }
}

#[fixture]
fn world() -> RefCell<FramingWorld> {
    RefCell::new(FramingWorld::default())
}

fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

#[given("an OK response carrying {body}")]
fn given_ok_response(world: &RefCell<FramingWorld>, body: String) {
    world.borrow_mut().wire = encode_response(Status::Ok, strip_quotes(&body).as_bytes());
}

#[given("a truncated OK response carrying {body} missing {missing} bytes")]
fn given_truncated_response(world: &RefCell<FramingWorld>, body: String, missing: usize) {
    let mut wire = encode_response(Status::Ok, strip_quotes(&body).as_bytes());
    wire.truncate(wire.len().saturating_sub(missing));
    world.borrow_mut().wire = wire;
}

#[given("a bad request response")]
fn given_bad_request(world: &RefCell<FramingWorld>) {
    world.borrow_mut().wire = encode_response(Status::BadRequest, b"");
}

#[when("the response arrives in chunks of {size} bytes")]
fn when_delivered(world: &RefCell<FramingWorld>, size: usize) {
    world.borrow_mut().deliver(size);
}

#[then("the decoded status is {status}")]
fn then_status(world: &RefCell<FramingWorld>, status: u16) {
    assert_eq!(world.borrow().frame().status, status);
}

#[then("the decoded body is {body}")]
fn then_body(world: &RefCell<FramingWorld>, body: String) {
    assert_eq!(world.borrow().frame().body, strip_quotes(&body).as_bytes());
}

#[scenario(path = "tests/features/response_framing.feature")]
fn response_framing(#[from(world)] world: RefCell<FramingWorld>) {
    drop(world);
}
