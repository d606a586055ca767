use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::TcpStream;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use super::wire::{self, Reply};
use super::{Arg, Gateway, GatewayError, RemoteHandle, RemoteValue};

/// One blocking request/response channel to the gateway server.
pub struct Connection<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Connection<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    fn round_trip(&mut self, command: &str) -> Result<Reply, GatewayError> {
        self.writer.write_all(command.as_bytes())?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(GatewayError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "gateway closed the connection",
            )));
        }
        wire::decode_reply(&line)
    }

    fn expect_value(&mut self, command: &str) -> Result<RemoteValue, GatewayError> {
        let reply = self.round_trip(command)?;
        self.resolve(reply)
    }

    /// Turn an argument into its command part, creating arrays engine-side.
    fn encode(&mut self, arg: &Arg) -> Result<String, GatewayError> {
        let Some((element_type, cells)) = wire::array_parts(arg) else {
            return wire::encode_arg(arg);
        };
        let array = match self.round_trip(&wire::array_create_command(element_type, cells.len()))? {
            Reply::Array(array) | Reply::Value(RemoteValue::Object(array)) => array,
            other => {
                return Err(GatewayError::Protocol(format!(
                    "array create returned {:?}",
                    other
                )))
            }
        };
        for (index, cell) in cells.iter().enumerate() {
            self.round_trip(&wire::array_set_command(&array, index, cell))?;
        }
        Ok(wire::reference_part(&array))
    }

    fn encode_all(&mut self, args: &[Arg]) -> Result<Vec<String>, GatewayError> {
        args.iter().map(|arg| self.encode(arg)).collect()
    }

    /// Read array replies back element by element.
    fn resolve(&mut self, reply: Reply) -> Result<RemoteValue, GatewayError> {
        match reply {
            Reply::Value(value) => Ok(value),
            Reply::Array(array) => {
                let len = self.expect_value(&wire::array_len_command(&array))?.as_i64()?;
                let mut items = Vec::with_capacity(len.max(0) as usize);
                for index in 0..len.max(0) as usize {
                    let item = self.round_trip(&wire::array_get_command(&array, index))?;
                    items.push(self.resolve(item)?);
                }
                Ok(RemoteValue::Array(items))
            }
        }
    }

    fn authenticate(&mut self, token: &str) -> Result<(), GatewayError> {
        match self.round_trip(&wire::auth_command(token))? {
            Reply::Value(RemoteValue::Void) => Ok(()),
            other => {
                warn!("unexpected reply to authentication: {:?}", other);
                Err(GatewayError::Protocol("authentication was not acknowledged".into()))
            }
        }
    }

    pub fn construct(&mut self, class: &str, args: &[Arg]) -> Result<RemoteHandle, GatewayError> {
        let parts = self.encode_all(args)?;
        debug!(class, args = args.len(), "remote construct");
        self.expect_value(&wire::construct_command(class, &parts))?
            .into_object()
    }

    pub fn call(&mut self, target: &str, method: &str, args: &[Arg]) -> Result<RemoteValue, GatewayError> {
        let parts = self.encode_all(args)?;
        debug!(object = target, method, "remote call");
        self.expect_value(&wire::call_command(target, method, &parts))
    }
}

/// Gateway client over a socket (or any buffered reader/writer pair).
pub struct TcpGateway<R = BufReader<TcpStream>, W = BufWriter<TcpStream>> {
    connection: Mutex<Connection<R, W>>,
}

impl TcpGateway {
    /// Connect to a gateway server, authenticating when a token is given.
    pub fn connect(host: &str, port: u16, auth_token: Option<&str>) -> Result<Self, GatewayError> {
        let stream = TcpStream::connect((host, port))?;
        stream.set_nodelay(true)?;
        let reader = BufReader::new(stream.try_clone()?);
        let writer = BufWriter::new(stream);
        let gateway = Self::from_parts(reader, writer);
        if let Some(token) = auth_token {
            gateway.lock().authenticate(token)?;
        }
        info!(host, port, "connected to engine gateway");
        Ok(gateway)
    }
}

impl<R: BufRead, W: Write> TcpGateway<R, W> {
    pub fn from_parts(reader: R, writer: W) -> Self {
        Self {
            connection: Mutex::new(Connection::new(reader, writer)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Connection<R, W>> {
        // A panic mid-call leaves the stream unusable either way; keep the guard.
        self.connection.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Give back the underlying reader and writer.
    pub fn into_parts(self) -> (R, W) {
        let connection = self.connection.into_inner().unwrap_or_else(|e| e.into_inner());
        (connection.reader, connection.writer)
    }
}

impl<R, W> Gateway for TcpGateway<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn construct(&self, class: &str, args: &[Arg]) -> Result<RemoteHandle, GatewayError> {
        self.lock().construct(class, args)
    }

    fn invoke(
        &self,
        target: &RemoteHandle,
        method: &str,
        args: &[Arg],
    ) -> Result<RemoteValue, GatewayError> {
        self.lock().call(target.as_str(), method, args)
    }

    fn invoke_static(
        &self,
        class: &str,
        method: &str,
        args: &[Arg],
    ) -> Result<RemoteValue, GatewayError> {
        self.lock().call(&wire::static_target(class), method, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scripted(replies: &str) -> TcpGateway<Cursor<Vec<u8>>, Vec<u8>> {
        TcpGateway::from_parts(Cursor::new(replies.as_bytes().to_vec()), Vec::new())
    }

    fn sent(gateway: TcpGateway<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        let (_, writer) = gateway.into_parts();
        String::from_utf8(writer).unwrap()
    }

    #[test]
    fn test_array_argument_is_materialized_first() {
        let gateway = scripted("!yto0\n!yv\n!yv\n!yro1\n");
        let handle = gateway
            .invoke_static("x.DoubleTensor", "create", &[Arg::DoubleArray(vec![1.0, 2.5])])
            .unwrap()
            .into_object()
            .unwrap();
        assert_eq!(handle, RemoteHandle::new("o1"));
        assert_eq!(
            sent(gateway),
            "a\nc\nsdouble\ni2\ne\n\
             a\ns\nro0\ni0\nd1.0\ne\n\
             a\ns\nro0\ni1\nd2.5\ne\n\
             c\nz:x.DoubleTensor\ncreate\nro0\ne\n"
        );
    }

    #[test]
    fn test_array_return_is_read_back() {
        let gateway = scripted("!yto4\n!yi2\n!yL3\n!yL1\n");
        let shape = gateway
            .invoke(&RemoteHandle::new("o2"), "getShape", &[])
            .unwrap()
            .into_longs()
            .unwrap();
        assert_eq!(shape, vec![3, 1]);
        assert_eq!(
            sent(gateway),
            "c\no2\ngetShape\ne\na\ne\nro4\ne\na\ng\nro4\ni0\ne\na\ng\nro4\ni1\ne\n"
        );
    }

    #[test]
    fn test_iteration_uses_has_next() {
        let gateway = scripted("!ygo5\n!ybtrue\n!yro6\n!ybfalse\n");
        let it = gateway.iterator(&RemoteHandle::new("o3")).unwrap();
        assert_eq!(
            gateway.next(&it).unwrap(),
            Some(RemoteValue::Object(RemoteHandle::new("o6")))
        );
        assert_eq!(gateway.next(&it).unwrap(), None);
    }

    #[test]
    fn test_remote_exception_surfaces() {
        let gateway = scripted("!xsjava.lang.NullPointerException\n");
        let err = gateway.construct("x.Broken", &[]).unwrap_err();
        assert!(matches!(err, GatewayError::Remote(ref m) if m == "java.lang.NullPointerException"));
    }

    #[test]
    fn test_closed_connection_is_io_error() {
        let gateway = scripted("");
        let err = gateway.invoke(&RemoteHandle::new("o1"), "sample", &[]).unwrap_err();
        assert!(matches!(err, GatewayError::Io(_)));
    }

    #[test]
    fn test_authentication() {
        let gateway = scripted("!yv\n");
        gateway.lock().authenticate("secret").unwrap();
        assert_eq!(sent(gateway), "A\nsecret\n");
    }
}
