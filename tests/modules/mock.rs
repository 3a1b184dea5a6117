//! A scripted in-memory server.

use std::{
    collections::VecDeque,
    io,
    sync::{Arc, Mutex},
};

use bson_wire::{
    wire::{Header, OpCode, HEADER_LEN},
    ConnectionOptions,
    Decoder,
    Document,
    Transport,
};

enum Scripted {
    Reply {
        flags: i32,
        cursor_id: i64,
        documents: Vec<Document>,
        response_to: Option<i32>,
    },
    Fail(io::ErrorKind),
}

#[derive(Default)]
struct State {
    sent: Vec<Vec<u8>>,
    script: VecDeque<Scripted>,
}

/// A [`Transport`] that records every message sent and answers with scripted replies. Clones
/// share state, so a test can keep one handle while the connection owns another.
#[derive(Clone, Default)]
pub struct MockServer {
    state: Arc<Mutex<State>>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options() -> ConnectionOptions {
        ConnectionOptions::default().host("mock")
    }

    /// Queues a reply carrying `documents` and `cursor_id`.
    pub fn batch(&self, cursor_id: i64, documents: Vec<Document>) -> &Self {
        self.push(Scripted::Reply {
            flags: 0,
            cursor_id,
            documents,
            response_to: None,
        })
    }

    /// Queues a reply with the given response flags.
    pub fn flagged(&self, flags: i32, documents: Vec<Document>) -> &Self {
        self.push(Scripted::Reply {
            flags,
            cursor_id: 0,
            documents,
            response_to: None,
        })
    }

    /// Queues a reply that claims to answer some other request.
    pub fn misdirected(&self, response_to: i32) -> &Self {
        self.push(Scripted::Reply {
            flags: 0,
            cursor_id: 0,
            documents: vec![],
            response_to: Some(response_to),
        })
    }

    /// Queues a receive failure.
    pub fn fail(&self, kind: io::ErrorKind) -> &Self {
        self.push(Scripted::Fail(kind))
    }

    fn push(&self, scripted: Scripted) -> &Self {
        self.state.lock().unwrap().script.push_back(scripted);
        self
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .map(|bytes| Sent::parse(bytes))
            .collect()
    }

    pub fn sent_op_codes(&self) -> Vec<OpCode> {
        self.sent().iter().map(|sent| sent.header.op_code).collect()
    }

    pub fn count(&self, op_code: OpCode) -> usize {
        self.sent_op_codes()
            .into_iter()
            .filter(|op| *op == op_code)
            .count()
    }
}

impl Transport for MockServer {
    fn send(&mut self, message: &[u8]) -> io::Result<()> {
        self.state.lock().unwrap().sent.push(message.to_vec());
        Ok(())
    }

    fn receive(&mut self) -> io::Result<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        let last_request = state
            .sent
            .last()
            .map(|bytes| Header::parse(bytes).unwrap().request_id)
            .unwrap_or(0);

        match state.script.pop_front() {
            Some(Scripted::Reply {
                flags,
                cursor_id,
                documents,
                response_to,
            }) => Ok(reply(
                response_to.unwrap_or(last_request),
                flags,
                cursor_id,
                &documents,
            )),
            Some(Scripted::Fail(kind)) => Err(kind.into()),
            None => Err(io::ErrorKind::UnexpectedEof.into()),
        }
    }

    fn reconnect(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn address(&self) -> String {
        "mock:27017".to_string()
    }
}

fn reply(response_to: i32, flags: i32, cursor_id: i64, documents: &[Document]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&flags.to_le_bytes());
    body.extend_from_slice(&cursor_id.to_le_bytes());
    body.extend_from_slice(&0i32.to_le_bytes());
    body.extend_from_slice(&(documents.len() as i32).to_le_bytes());
    for doc in documents {
        doc.to_writer(&mut body).unwrap();
    }

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&((HEADER_LEN + body.len()) as i32).to_le_bytes());
    bytes.extend_from_slice(&1000i32.to_le_bytes());
    bytes.extend_from_slice(&response_to.to_le_bytes());
    bytes.extend_from_slice(&(OpCode::Reply as i32).to_le_bytes());
    bytes.extend(body);
    bytes
}

/// A message the client sent, with accessors for the fields tests care about.
pub struct Sent {
    pub header: Header,
    pub body: Vec<u8>,
}

impl Sent {
    fn parse(bytes: &[u8]) -> Self {
        let header = Header::parse(bytes).unwrap();
        assert_eq!(header.message_length as usize, bytes.len());
        Sent {
            header,
            body: bytes[HEADER_LEN..].to_vec(),
        }
    }

    fn i32_at(&self, offset: usize) -> i32 {
        i32::from_le_bytes(self.body[offset..offset + 4].try_into().unwrap())
    }

    /// Offset just past the collection name, which always follows the first int32.
    fn after_namespace(&self) -> usize {
        let nul = self.body[4..].iter().position(|b| *b == 0).unwrap();
        4 + nul + 1
    }

    pub fn namespace(&self) -> String {
        String::from_utf8(self.body[4..self.after_namespace() - 1].to_vec()).unwrap()
    }

    pub fn flags(&self) -> i32 {
        self.i32_at(0)
    }

    /// numberToReturn of a query or get-more.
    pub fn number_to_return(&self) -> i32 {
        match self.header.op_code {
            OpCode::Query => self.i32_at(self.after_namespace() + 4),
            OpCode::GetMore => self.i32_at(self.after_namespace()),
            other => panic!("{other:?} has no numberToReturn"),
        }
    }

    pub fn number_to_skip(&self) -> i32 {
        assert_eq!(self.header.op_code, OpCode::Query);
        self.i32_at(self.after_namespace())
    }

    /// The documents carried after the fixed fields.
    pub fn documents(&self) -> Vec<Document> {
        let start = match self.header.op_code {
            OpCode::Query => self.after_namespace() + 8,
            OpCode::Insert => self.after_namespace(),
            OpCode::Update | OpCode::Delete => self.after_namespace() + 4,
            other => panic!("{other:?} carries no documents"),
        };

        let mut decoder = Decoder::new(&self.body[start..]);
        let mut documents = Vec::new();
        while (decoder.position() as usize) < self.body.len() - start {
            documents.push(decoder.decode_document().unwrap());
        }
        documents
    }

    pub fn cursor_ids(&self) -> Vec<i64> {
        let ids = match self.header.op_code {
            OpCode::GetMore => &self.body[self.after_namespace() + 4..],
            OpCode::KillCursors => &self.body[8..],
            other => panic!("{other:?} carries no cursor ids"),
        };
        ids.chunks(8)
            .map(|chunk| i64::from_le_bytes(chunk.try_into().unwrap()))
            .collect()
    }
}
