//! Loopback demo: two sessions exchanging a handful of messages over an
//! in-memory "wire" with a simple drop policy, driven by repeated
//! `update`/`input` cycles.
//!
//! There is no socket involved — the two ends are joined directly by a
//! pair of `VecDeque<Vec<u8>>` channels, so the demo can run without a
//! real network.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use arqcore::{Config, Session};

fn main() {
    env_logger::init();

    let a_to_b: Rc<RefCell<VecDeque<Vec<u8>>>> = Rc::new(RefCell::new(VecDeque::new()));
    let b_to_a: Rc<RefCell<VecDeque<Vec<u8>>>> = Rc::new(RefCell::new(VecDeque::new()));

    let conv = 0xC0FFEE;

    let out_a = a_to_b.clone();
    let mut a = Session::new(
        conv,
        0,
        Config::default(),
        Box::new(move |bytes: &[u8]| out_a.borrow_mut().push_back(bytes.to_vec())),
    );

    let out_b = b_to_a.clone();
    let mut b = Session::new(
        conv,
        0,
        Config::default(),
        Box::new(move |bytes: &[u8]| out_b.borrow_mut().push_back(bytes.to_vec())),
    );

    a.send(b"hello from session a").unwrap();
    a.send(b"a second message, also from a").unwrap();

    let mut recv_buf = [0u8; 2048];
    let mut delivered = 0;

    for t in (0..5_000).step_by(10) {
        a.update(t);
        b.update(t);

        while let Some(datagram) = a_to_b.borrow_mut().pop_front() {
            if let Err(err) = b.input(&datagram) {
                log::warn!("b: malformed datagram dropped: {err}");
            }
        }
        while let Some(datagram) = b_to_a.borrow_mut().pop_front() {
            if let Err(err) = a.input(&datagram) {
                log::warn!("a: malformed datagram dropped: {err}");
            }
        }

        while let Ok(n) = b.recv(&mut recv_buf) {
            delivered += 1;
            println!(
                "b received message {}: {:?}",
                delivered,
                String::from_utf8_lossy(&recv_buf[..n])
            );
        }

        if delivered >= 2 {
            break;
        }
    }

    if delivered < 2 {
        eprintln!("demo ended without delivering both messages");
        std::process::exit(1);
    }
}
