use std::fs::File;
use std::io::{self, BufWriter, Read};

use futures::FutureExt;
use quickcheck_macros::quickcheck;
use stream_bridge::{
    async_writable_blocking_collect_pair,
    async_writable_blocking_readable_pair, blocking_readable_to_async,
    blocking_writable_async_readable_pair, blocking_writable_to_async, scoped,
    BaseStreamExt, BlockingPool, ReadableStream, WritableStream,
};
use tempdir::TempDir;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("Unable to create a runtime")
}

/// Read sizes of 0 would never make progress, bump them to 1.
fn read_sizes(sizes: &[u8]) -> Vec<usize> {
    let mut sizes: Vec<usize> =
        sizes.iter().map(|&s| usize::from(s).max(1)).collect();
    if sizes.is_empty() {
        sizes.push(7);
    }
    sizes
}

#[quickcheck]
fn streaming_reader_reassembles_writes(
    writes: Vec<Vec<u8>>,
    sizes: Vec<u8>,
) -> bool {
    let expected = writes.concat();
    let sizes = read_sizes(&sizes);
    let (mut writer, mut reader) = async_writable_blocking_readable_pair();

    let consumer = std::thread::spawn(move || {
        let mut out = Vec::new();
        for size in sizes.iter().cycle() {
            let mut buf = vec![0u8; *size];
            let n = reader.read_into(&mut buf).unwrap();
            // Never short unless at end of stream.
            if n < *size {
                out.extend_from_slice(&buf[..n]);
                let mut tail = [0u8; 1];
                assert_eq!(reader.read_into(&mut tail).unwrap(), 0);
                return out;
            }
            out.extend_from_slice(&buf);
        }
        unreachable!()
    });

    runtime().block_on(async {
        for chunk in &writes {
            writer.write(chunk).await.unwrap();
        }
        writer.wait_closed().await.unwrap();
    });

    consumer.join().unwrap() == expected
}

#[quickcheck]
fn collector_returns_concatenation(writes: Vec<Vec<u8>>, hint: u8) -> bool {
    let expected = writes.concat();
    let (mut writer, mut collect) =
        async_writable_blocking_collect_pair(usize::from(hint));
    let consumer = std::thread::spawn(move || collect.get().unwrap());

    runtime().block_on(async {
        for chunk in &writes {
            writer.write(chunk).await.unwrap();
        }
        writer.wait_closed().await.unwrap();
    });

    consumer.join().unwrap() == expected
}

#[quickcheck]
fn async_reader_reassembles_blocking_writes(
    writes: Vec<Vec<u8>>,
    sizes: Vec<u8>,
) -> bool {
    let expected = writes.concat();
    let sizes = read_sizes(&sizes);
    let (mut writer, mut reader) = blocking_writable_async_readable_pair();

    let producer = std::thread::spawn(move || {
        for chunk in &writes {
            writer.write_bytes(chunk).unwrap();
        }
        writer.close();
    });

    let out = runtime().block_on(async move {
        let mut out = Vec::new();
        for size in sizes.iter().cycle() {
            let part = reader.read(Some(*size)).await.unwrap();
            if part.is_empty() {
                break;
            }
            out.extend_from_slice(&part);
        }
        reader.wait_closed().await.unwrap();
        out
    });

    producer.join().unwrap();
    out == expected
}

#[test]
fn abandoned_reader_does_not_hang_writer() {
    let (mut writer, mut reader) = async_writable_blocking_readable_pair();
    let consumer = std::thread::spawn(move || {
        let mut buf = [0u8; 2];
        reader.read_into(&mut buf).unwrap();
        reader.close();
    });

    let outcome = runtime().block_on(async {
        let mut outcome = Ok(0);
        for _ in 0..64 {
            outcome = writer.write(b"0123456789").await;
            if outcome.is_err() {
                break;
            }
        }
        writer.wait_closed().await.unwrap();
        outcome
    });

    consumer.join().unwrap();
    assert!(outcome.is_err());
}

/// File -> async pipe -> blocking consumer -> file.
#[test]
fn copies_file_through_pipe() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new("pipe_copy").unwrap();
    let source = dir.path().join("source.bin");
    let target = dir.path().join("target.bin");
    let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(&source, &payload).unwrap();

    let (mut writer, mut reader) = async_writable_blocking_readable_pair();
    let target_path = target.clone();
    let consumer = std::thread::spawn(move || -> io::Result<u64> {
        let mut out = BufWriter::new(File::create(target_path)?);
        io::copy(&mut reader, &mut out)
    });

    let rt = runtime();
    rt.block_on(async {
        let pool = BlockingPool::current();
        let file = File::open(&source).unwrap();
        let source_stream = blocking_readable_to_async(pool, file);
        scoped(source_stream, |input| {
            async move {
                loop {
                    let chunk = input.read(Some(16 * 1024)).await?;
                    if chunk.is_empty() {
                        break;
                    }
                    writer.write(&chunk).await?;
                }
                writer.wait_closed().await
            }
            .boxed()
        })
        .await
        .unwrap();
    });

    assert_eq!(consumer.join().unwrap().unwrap(), payload.len() as u64);
    let mut copied = Vec::new();
    File::open(&target)
        .unwrap()
        .read_to_end(&mut copied)
        .unwrap();
    assert_eq!(copied, payload);
}

#[test]
fn async_writes_land_in_file() {
    let dir = TempDir::new("async_file").unwrap();
    let path = dir.path().join("out.txt");

    runtime().block_on(async {
        let file = File::create(&path).unwrap();
        let stream = blocking_writable_to_async(BlockingPool::current(), file);
        // The open mode is only checked on unix.
        assert_eq!(stream.writable(), cfg!(unix));
        scoped(stream, |out| {
            async move {
                out.write(b"line one\n").await?;
                out.write(b"line two\n").await?;
                Ok(())
            }
            .boxed()
        })
        .await
        .unwrap();
    });

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "line one\nline two\n"
    );
}
