use std::io::Write;
use std::os::unix::net::UnixStream;
use std::sync::{Arc, Mutex};
use std::thread;

use paramfs_core::{RegisterFile, StructureConfig, Syncer, SyncerSet};
use paramfs_remote::{handle_connection, Client, CommandTable, Error, ParameterManager, Server, ServerConfig};
use paramfs_wire::{Message, MessageState, Packet, DEFAULT_MAX_FRAME_SIZE};

const STRUCTURE: &str = r#"{
    "name": "codec",
    "children": [
        {"type": "component", "name": "dac", "children": [
            {"type": "bit_block", "name": "ctrl", "size": 2, "bits": [
                {"name": "enable", "pos": 0, "size": 1},
                {"name": "volume", "pos": 8, "size": 7, "max": 100}
            ]}
        ]},
        {"type": "integer", "name": "rate", "size": 4}
    ]
}"#;

fn manager_with_registers() -> (ParameterManager, RegisterFile) {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(STRUCTURE.as_bytes()).unwrap();
    let config = StructureConfig::load(file.path()).unwrap();

    let registers = RegisterFile::new(0);
    let syncers: SyncerSet = [Arc::new(registers.clone()) as Arc<dyn Syncer>]
        .into_iter()
        .collect();
    (
        ParameterManager::from_config(&config, syncers).unwrap(),
        registers,
    )
}

fn start_server() -> (std::net::SocketAddr, Arc<Mutex<ParameterManager>>, RegisterFile) {
    let (manager, registers) = manager_with_registers();
    let config = ServerConfig {
        listen: "127.0.0.1:0".to_string(),
        ..ServerConfig::default()
    };
    let server = Server::bind(&config, manager).unwrap();
    let addr = server.local_addr().unwrap();
    let shared = server.manager();
    thread::spawn(move || server.serve());
    (addr, shared, registers)
}

#[test]
fn test_message_round_trip_over_socket_pair() {
    let (mut a, mut b) = UnixStream::pair().unwrap();

    let mut msg = Message::new(7);
    msg.allocate(Message::string_size("hello") + 4);
    msg.write_string("hello");
    msg.write_u32(42);
    msg.send(&mut a).unwrap();

    let mut received = Message::recv(&mut b, DEFAULT_MAX_FRAME_SIZE).unwrap();
    assert_eq!(received.kind(), 7);
    assert_eq!(received.state(), MessageState::Filled);
    assert_eq!(received.read_string().unwrap(), "hello");
    assert_eq!(received.read_u32(), 42);
    assert_eq!(received.remaining_data_size(), 0);
}

#[test]
fn test_back_to_back_frames_are_separated() {
    let (mut a, mut b) = UnixStream::pair().unwrap();

    Packet::Success("first".into()).send(&mut a).unwrap();
    Packet::Failure("second".into()).send(&mut a).unwrap();

    assert_eq!(
        Packet::recv(&mut b, DEFAULT_MAX_FRAME_SIZE).unwrap(),
        Packet::Success("first".into())
    );
    assert_eq!(
        Packet::recv(&mut b, DEFAULT_MAX_FRAME_SIZE).unwrap(),
        Packet::Failure("second".into())
    );
}

#[test]
fn test_peer_close_is_reported_as_disconnect() {
    let (a, mut b) = UnixStream::pair().unwrap();
    drop(a);

    let err = Packet::recv(&mut b, DEFAULT_MAX_FRAME_SIZE).unwrap_err();
    assert!(err.is_disconnect());
}

#[test]
fn test_handle_connection_over_socket_pair() {
    let (manager, registers) = manager_with_registers();
    let manager = Mutex::new(manager);
    let (server_side, client_side) = UnixStream::pair().unwrap();

    let worker = thread::spawn(move || {
        let mut stream = server_side;
        handle_connection(&mut stream, &manager, &CommandTable::standard(), DEFAULT_MAX_FRAME_SIZE)
            .map(|()| manager)
    });

    let mut client = Client::new(client_side);
    assert_eq!(
        client
            .send_command("setParameter", ["codec/dac/ctrl/volume", "80"])
            .unwrap(),
        "Done"
    );
    assert_eq!(
        client.send_command("getParameter", ["codec/dac/ctrl/volume"]).unwrap(),
        "80"
    );
    drop(client);

    let manager = worker.join().unwrap().unwrap();
    let manager = manager.into_inner().unwrap();
    assert_eq!(&manager.blackboard().as_bytes()[..2], &[0, 80]);
    assert_eq!(registers.snapshot(), vec![0, 80]);
}

#[test]
fn test_tcp_set_and_get() {
    let (addr, _, registers) = start_server();
    let mut client = Client::connect(addr).unwrap();

    client
        .send_command("setParameter", ["codec/dac/ctrl/enable", "true"])
        .unwrap();
    client
        .send_command("setParameter", ["codec/rate", "48000"])
        .unwrap();

    assert_eq!(
        client.send_command("getParameter", ["codec/rate"]).unwrap(),
        "48000"
    );
    assert_eq!(
        client.send_command("getParameter", ["codec/dac/ctrl/enable"]).unwrap(),
        "1"
    );
    assert_eq!(registers.snapshot(), vec![1, 0, 0x80, 0xBB, 0, 0]);
    assert_eq!(registers.flush_count(), 2);
}

#[test]
fn test_tcp_failure_answers() {
    let (addr, _, _) = start_server();
    let mut client = Client::connect(addr).unwrap();

    let err = client
        .send_command("setParameter", ["codec/dac/ctrl/volume", "101"])
        .unwrap_err();
    assert!(matches!(&err, Error::CommandFailed(m) if m.contains("out of range")));

    let err = client
        .send_command("getParameter", ["codec/adc"])
        .unwrap_err();
    assert!(matches!(&err, Error::CommandFailed(m) if m.contains("no element 'adc'")));

    // The connection survives failed commands.
    assert_eq!(
        client.send_command("getOutputRawFormat", Vec::<String>::new()).unwrap(),
        "dec"
    );
}

#[test]
fn test_tcp_clients_share_parameters() {
    let (addr, shared, _) = start_server();
    let mut writer = Client::connect(addr).unwrap();
    let mut reader = Client::connect(addr).unwrap();

    writer
        .send_command("setOutputRawFormat", ["hex"])
        .unwrap();
    writer
        .send_command("setParameter", ["codec/dac/ctrl/volume", "0x64"])
        .unwrap();

    assert_eq!(
        reader.send_command("getParameter", ["codec/dac/ctrl/volume"]).unwrap(),
        "0x64"
    );
    assert_eq!(
        shared.lock().unwrap().get_value("codec/dac/ctrl/volume").unwrap(),
        "0x64"
    );
}

#[test]
fn test_batch_write_flushes_block_once() {
    let (mut manager, registers) = manager_with_registers();

    let committed = manager
        .set_values([
            ("codec/dac/ctrl/enable", "1"),
            ("codec/dac/ctrl/volume", "55"),
        ])
        .unwrap();

    assert_eq!(committed, 1);
    assert_eq!(registers.flush_count(), 1);
    assert_eq!(registers.snapshot(), vec![1, 55]);
}
