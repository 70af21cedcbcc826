//! Integration tests for the event bus and the supervision loop.

use mediagraph::element::{Pad, PadRef};
use mediagraph::pipeline::{
    Bus, Event, Flow, LoopConfig, LoopExit, MainLoop, Pipeline, State, TimerFlow,
    default_handler,
};
use mediagraph::runtime::Runtime;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::NamedTempFile;

const DEADLINE: Duration = Duration::from_secs(10);

fn audio_player(runtime: &Runtime, location: &std::path::Path) -> Pipeline {
    let mut pipeline = Pipeline::new(runtime, "audio-player");
    pipeline.make("filesrc", "source").unwrap();
    pipeline.make("oggdemux", "demuxer").unwrap();
    pipeline.make("vorbisdec", "decoder").unwrap();
    pipeline.make("fakesink", "output").unwrap();

    pipeline
        .element_mut("source")
        .unwrap()
        .set_property("location", location)
        .unwrap();
    pipeline
        .element_mut("demuxer")
        .unwrap()
        .set_property("duration-ms", 50i64)
        .unwrap();

    pipeline.link("source", "demuxer").unwrap();
    pipeline.link("decoder", "output").unwrap();
    pipeline.connect_pad_added("demuxer", "decoder").unwrap();
    pipeline
}

/// A demuxer's runtime pad is linked before its stream ends.
#[tokio::test]
async fn test_dynamic_pad_linked_then_eos() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"OggS").unwrap();

    let runtime = Runtime::new();
    let mut pipeline = audio_player(&runtime, file.path());
    pipeline.set_state(State::Playing).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let record = seen.clone();
    let mut main_loop = MainLoop::default();
    let exit = tokio::time::timeout(
        DEADLINE,
        main_loop.run(&mut pipeline, move |pipeline, event| {
            record.borrow_mut().push(event.type_name());
            default_handler(pipeline, event)
        }),
    )
    .await
    .expect("loop did not finish")
    .unwrap();

    assert_eq!(exit, LoopExit::Stopped);
    assert_eq!(pipeline.state(), State::Null);
    assert!(pipeline.links().iter().any(|link| {
        link.src == PadRef::new("demuxer", "audio_0") && link.sink == PadRef::new("decoder", "sink")
    }));

    let seen = seen.borrow();
    let pad_added = seen.iter().position(|t| *t == "pad-added").unwrap();
    let eos = seen.iter().position(|t| *t == "eos").unwrap();
    assert!(pad_added < eos);
    assert_eq!(seen.last(), Some(&"eos"));
}

/// An error stops the loop and later events are never dispatched.
#[tokio::test]
async fn test_error_event_stops_loop() {
    let runtime = Runtime::new();
    let mut pipeline = Pipeline::new(&runtime, "failing");
    pipeline.make("fakesink", "sink").unwrap();
    pipeline.set_state(State::Playing).unwrap();
    pipeline.drain(|_, _| Flow::Continue);

    pipeline.bus().post(Event::Error {
        source: "sink".to_string(),
        message: "device unplugged".to_string(),
        debug: None,
    });
    // Posted after the error, never dispatched.
    pipeline.bus().post(Event::Warning {
        source: "sink".to_string(),
        message: "late".to_string(),
    });

    let mut handled = 0;
    let exit = MainLoop::default()
        .run(&mut pipeline, |pipeline, event| {
            handled += 1;
            default_handler(pipeline, event)
        })
        .await
        .unwrap();

    assert_eq!(exit, LoopExit::Stopped);
    assert_eq!(handled, 1);
    assert_eq!(pipeline.state(), State::Null);
    // Leaving Ready flushes whatever was still queued.
    assert!(pipeline.bus().is_empty());
}

/// Concurrent producers keep their own post order.
#[test]
fn test_bus_keeps_per_producer_order() {
    let bus = Bus::new();
    bus.set_flushing(false);
    let producers = 4;
    let per_producer = 250;

    let workers: Vec<_> = (0..producers)
        .map(|p| {
            let bus = bus.clone();
            thread::spawn(move || {
                for n in 0..per_producer {
                    assert!(bus.post(Event::Custom {
                        source: format!("worker{p}"),
                        name: n.to_string(),
                    }));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let mut next = vec![0usize; producers];
    let mut total = 0;
    bus.drain(|event| {
        let Event::Custom { source, name } = event else {
            panic!("unexpected event {event}");
        };
        let p: usize = source.trim_start_matches("worker").parse().unwrap();
        assert_eq!(name.parse::<usize>().unwrap(), next[p]);
        next[p] += 1;
        total += 1;
        Flow::Continue
    });

    assert_eq!(total, producers * per_producer);
    assert_eq!(bus.posted(), (producers * per_producer) as u64);
}

/// The loop hands events over in the order they were posted.
#[tokio::test]
async fn test_events_dispatched_in_post_order() {
    let runtime = Runtime::new();
    let mut pipeline = Pipeline::new(&runtime, "ordered");
    pipeline.make("fakesink", "sink").unwrap();
    pipeline.set_state(State::Ready).unwrap();
    pipeline.drain(|_, _| Flow::Continue);

    for n in 0..10 {
        pipeline.bus().post(Event::Custom {
            source: "app".to_string(),
            name: n.to_string(),
        });
    }
    pipeline.bus().post(Event::Eos { source: None });

    let mut names = Vec::new();
    let exit = MainLoop::new(LoopConfig::responsive())
        .run(&mut pipeline, |pipeline, event| {
            if let Event::Custom { name, .. } = event {
                names.push(name.clone());
            }
            default_handler(pipeline, event)
        })
        .await
        .unwrap();

    assert_eq!(exit, LoopExit::Stopped);
    let expected: Vec<String> = (0..10).map(|n| n.to_string()).collect();
    assert_eq!(names, expected);
}

/// A periodic timer can query the position and quit the loop.
#[tokio::test]
async fn test_position_timer_and_cancel() {
    let runtime = Runtime::new();
    let mut pipeline = Pipeline::new(&runtime, "ticking");
    pipeline.make("videotestsrc", "src").unwrap();
    pipeline.make("fakesink", "sink").unwrap();
    pipeline.link("src", "sink").unwrap();
    pipeline.set_state(State::Playing).unwrap();

    let mut main_loop = MainLoop::default();
    let handle = main_loop.handle();
    let positions = Rc::new(RefCell::new(Vec::new()));
    let record = positions.clone();
    main_loop.add_timer(Duration::from_millis(10), move |pipeline| {
        record.borrow_mut().extend(pipeline.query_position());
        if record.borrow().len() == 5 {
            handle.quit();
        }
        TimerFlow::Repeat
    });

    let exit = tokio::time::timeout(DEADLINE, main_loop.run(&mut pipeline, default_handler))
        .await
        .expect("loop did not finish")
        .unwrap();

    assert_eq!(exit, LoopExit::Cancelled);
    assert_eq!(pipeline.state(), State::Null);
    let positions = positions.borrow();
    assert_eq!(positions.len(), 5);
    assert!(positions.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(pipeline.query_position(), None);
}

/// A handle quits the loop from a foreign thread.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_quit_from_another_thread() {
    let runtime = Runtime::new();
    let mut pipeline = Pipeline::new(&runtime, "remote");
    pipeline.make("fakesink", "sink").unwrap();
    pipeline.set_state(State::Playing).unwrap();

    let mut main_loop = MainLoop::default();
    let handle = Arc::new(main_loop.handle());
    let quitter = {
        let handle = handle.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            handle.quit();
        })
    };

    let exit = tokio::time::timeout(DEADLINE, main_loop.run(&mut pipeline, default_handler))
        .await
        .expect("loop did not finish")
        .unwrap();
    quitter.join().unwrap();

    assert_eq!(exit, LoopExit::Cancelled);
    assert_eq!(pipeline.state(), State::Null);
    // The loop can be run again after a cancel.
    assert!(!handle.is_quit());
}

/// The blocking runner plays a file through the playback element.
#[test]
fn test_run_blocking_playback_element() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"media").unwrap();

    let runtime = Runtime::new();
    let mut pipeline = Pipeline::new(&runtime, "playback");
    pipeline.make("playbin", "player").unwrap();
    let uri = format!("file://{}", file.path().display());
    {
        let player = pipeline.element_mut("player").unwrap();
        player.set_property("location", uri.as_str()).unwrap();
        player.set_property("duration-ms", 40i64).unwrap();
    }
    pipeline.set_state(State::Playing).unwrap();

    let exit = MainLoop::default()
        .run_blocking(&mut pipeline, default_handler)
        .unwrap();
    assert_eq!(exit, LoopExit::Stopped);
    assert_eq!(pipeline.state(), State::Null);
}

/// A shut down runtime creates no more elements.
#[test]
fn test_runtime_shutdown_refuses_new_elements() {
    let runtime = Runtime::new();
    let mut pipeline = Pipeline::new(&runtime, "late");
    runtime.shutdown();
    assert!(pipeline.make("fakesink", "sink").is_err());
    assert!(matches!(
        pipeline.set_state(State::Ready),
        Err(mediagraph::Error::IncompleteAssembly(_))
    ));
}

/// Injected pad and end-of-stream events are handled in order by the loop.
#[tokio::test]
async fn test_injected_pad_added_then_eos() {
    let runtime = Runtime::new();
    let mut pipeline = Pipeline::new(&runtime, "injected");
    pipeline.make("oggdemux", "demuxer").unwrap();
    pipeline.make("vorbisdec", "decoder").unwrap();
    pipeline.make("fakesink", "output").unwrap();
    {
        // No pads of its own and no end of stream before the test is over.
        let demuxer = pipeline.element_mut("demuxer").unwrap();
        demuxer.set_property("streams", 0i64).unwrap();
        demuxer.set_property("duration-ms", 60_000i64).unwrap();
    }
    pipeline.link("decoder", "output").unwrap();
    pipeline.connect_pad_added("demuxer", "decoder").unwrap();
    pipeline.set_state(State::Playing).unwrap();
    pipeline.drain(|_, _| Flow::Continue);

    let template = pipeline.element("demuxer").unwrap().templates()[1].clone();
    pipeline.bus().post(Event::PadAdded {
        element: "demuxer".to_string(),
        pad: Pad::from_template(&template, "audio_0"),
    });
    pipeline.bus().post(Event::Eos { source: None });

    let mut seen = Vec::new();
    let exit = tokio::time::timeout(
        DEADLINE,
        MainLoop::default().run(&mut pipeline, |pipeline, event| {
            seen.push(event.type_name());
            default_handler(pipeline, event)
        }),
    )
    .await
    .expect("loop did not finish")
    .unwrap();

    assert_eq!(exit, LoopExit::Stopped);
    assert_eq!(pipeline.state(), State::Null);
    assert!(pipeline.links().iter().any(|link| {
        link.src == PadRef::new("demuxer", "audio_0") && link.sink == PadRef::new("decoder", "sink")
    }));
    let pad_added = seen.iter().position(|t| *t == "pad-added").unwrap();
    assert!(pad_added < seen.len() - 1);
    assert_eq!(seen.last(), Some(&"eos"));
}
