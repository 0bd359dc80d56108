//! Shared fixtures for integration tests

#![allow(dead_code)]

use byteorder::{BigEndian, WriteBytesExt};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread;

use fitslice::fits::{Card, Header, BLOCK_SIZE};

/// Big-endian i16 pixels whose value is their linear index
pub fn i16_ramp(count: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(count * 2);
    for i in 0..count {
        data.write_i16::<BigEndian>(i as i16).unwrap();
    }
    data
}

/// Big-endian f32 pixels whose value is their linear index
pub fn f32_ramp(count: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(count * 4);
    for i in 0..count {
        data.write_f32::<BigEndian>(i as f32).unwrap();
    }
    data
}

pub fn decode_i16(bytes: &[u8]) -> Vec<i16> {
    bytes.chunks_exact(2).map(|c| i16::from_be_bytes([c[0], c[1]])).collect()
}

fn push_unit(bytes: &mut Vec<u8>, cards: Vec<Card>, data: &[u8]) {
    bytes.extend_from_slice(&Header::from_cards(cards).to_bytes());
    bytes.extend_from_slice(data);
    let rem = bytes.len() % BLOCK_SIZE;
    if rem != 0 {
        bytes.resize(bytes.len() + BLOCK_SIZE - rem, 0);
    }
}

fn axis_cards(first: Card, bitpix: i64, axes: &[u64]) -> Vec<Card> {
    let mut cards = vec![first, Card::integer("BITPIX", bitpix, None), Card::integer("NAXIS", axes.len() as i64, None)];
    for (i, len) in axes.iter().enumerate() {
        cards.push(Card::integer(&format!("NAXIS{}", i + 1), *len as i64, None));
    }
    cards
}

/// Primary without data, then SCI/ERR/DQ for versions 1 and 2 (100x60 i16
/// ramps), then a 200x50 f32 image named WAVE
pub fn survey_file() -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut primary = axis_cards(Card::logical("SIMPLE", true, None), 16, &[]);
    primary.push(Card::logical("EXTEND", true, None));
    primary.push(Card::string("TELESCOP", "TEST", None));
    push_unit(&mut bytes, primary, &[]);

    for ver in 1..=2 {
        for name in ["SCI", "ERR", "DQ"] {
            let mut cards = axis_cards(Card::string("XTENSION", "IMAGE", None), 16, &[100, 60]);
            cards.push(Card::integer("PCOUNT", 0, None));
            cards.push(Card::integer("GCOUNT", 1, None));
            cards.push(Card::string("EXTNAME", name, None));
            cards.push(Card::integer("EXTVER", ver, None));
            cards.push(Card::string("CHECKSUM", "0000000000000000", None));
            push_unit(&mut bytes, cards, &i16_ramp(6000));
        }
    }

    let mut cards = axis_cards(Card::string("XTENSION", "IMAGE", None), -32, &[200, 50]);
    cards.push(Card::integer("PCOUNT", 0, None));
    cards.push(Card::integer("GCOUNT", 1, None));
    cards.push(Card::string("EXTNAME", "WAVE", None));
    push_unit(&mut bytes, cards, &f32_ramp(10_000));
    bytes
}

/// Path under the system temp dir, unique per test and process
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("fitslice-{}-{}", std::process::id(), name))
}

/// Serve `body` over HTTP on a loopback port, honouring single byte ranges
///
/// Returns the URL. The server thread lives until the test process exits.
pub fn serve(body: Vec<u8>) -> String {
    serve_until(body, None)
}

/// Like [`serve`], but any GET whose range reaches `fail_from` or beyond
/// gets `503 Service Unavailable`
pub fn serve_failing_from(body: Vec<u8>, fail_from: usize) -> String {
    serve_until(body, Some(fail_from))
}

fn serve_until(body: Vec<u8>, fail_from: Option<usize>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let _ = handle(stream, &body, fail_from);
                }
                Err(_) => break,
            }
        }
    });
    format!("http://{}/survey.fits", addr)
}

fn handle(mut stream: TcpStream, body: &[u8], fail_from: Option<usize>) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    let mut range = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 || line == "\r\n" || line == "\n" {
            break;
        }
        let lower = line.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("range:") {
            let spec = value.trim().trim_start_matches("bytes=").to_string();
            if let Some((a, b)) = spec.split_once('-') {
                range = Some((a.parse::<usize>().unwrap(), b.parse::<usize>().unwrap()));
            }
        }
    }

    let method = request_line.split_whitespace().next().unwrap_or("");
    let response = match (method, range) {
        ("HEAD", _) => format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nAccept-Ranges: bytes\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes(),
        ("GET", Some((_, last))) if fail_from.map_or(false, |f| last >= f) => {
            b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec()
        }
        ("GET", Some((first, last))) if first <= last && last < body.len() => {
            let mut out = format!(
                "HTTP/1.1 206 Partial Content\r\nContent-Length: {}\r\nContent-Range: bytes {}-{}/{}\r\nConnection: close\r\n\r\n",
                last - first + 1,
                first,
                last,
                body.len()
            )
            .into_bytes();
            out.extend_from_slice(&body[first..=last]);
            out
        }
        _ => b"HTTP/1.1 416 Range Not Satisfiable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec(),
    };

    stream.write_all(&response)?;
    stream.flush()
}
