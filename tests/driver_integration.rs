//! Integration tests running real schedules through the drivers

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tidewater::driver::CancellationToken;
use tidewater::prelude::*;
use tidewater::testing::RecordingSleeper;

fn ms(n: u64) -> PositiveDuration {
    PositiveDuration::from_millis(n)
}

#[derive(Debug, Clone, PartialEq)]
enum FetchError {
    Timeout,
    NotFound,
}

#[test]
fn dry_run_matches_real_run() {
    let schedule = exponential(ms(10), 2.0)
        .max_delay(ms(50))
        .union(recurs(5));
    let planned: Vec<Duration> = schedule
        .clone()
        .delays()
        .map(|d| d.as_duration())
        .collect();

    let sleeper = RecordingSleeper::new();
    let result = Runner::new()
        .with_sleeper(sleeper.clone())
        .retry(&schedule, || Err::<(), _>(FetchError::Timeout));

    assert_eq!(result, Err(RunError::Failed(FetchError::Timeout)));
    assert_eq!(sleeper.recorded(), planned);
    assert_eq!(sleeper.total(), Duration::from_millis(10 + 20 + 40 + 50 + 50));
}

#[test]
fn retry_while_stops_on_permanent_error() {
    let attempts = AtomicU32::new(0);
    let sleeper = RecordingSleeper::new();

    let result = Runner::new().with_sleeper(sleeper.clone()).retry_while(
        &spaced(ms(3)).union(recurs(10)),
        || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(if n < 2 {
                FetchError::Timeout
            } else {
                FetchError::NotFound
            })
        },
        |err| *err == FetchError::Timeout,
    );

    assert_eq!(result, Err(RunError::Failed(FetchError::NotFound)));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(sleeper.recorded().len(), 2);
}

#[test]
fn real_sleeps_take_real_time() {
    let start = Instant::now();
    let result = repeat(&spaced(ms(5)).union(recurs(3)), || Ok::<_, ()>(()));

    assert_eq!(result, Ok(()));
    assert!(start.elapsed() >= Duration::from_millis(15));
}

#[test]
fn observer_sees_every_decision() {
    let seen = Mutex::new(Vec::new());
    let result = Runner::new()
        .with_sleeper(RecordingSleeper::new())
        .observe(|event: &ScheduleEvent<'_, u32, ()>| {
            seen.lock().unwrap().push((event.attempt, event.decision));
        })
        .fold(&recurs(2), 0u32, |acc, n| acc + n, || Ok(10));

    assert_eq!(result, Ok(30));
    assert_eq!(
        seen.into_inner().unwrap(),
        vec![
            (1, ScheduleResult::RunAgain),
            (2, ScheduleResult::RunAgain),
            (3, ScheduleResult::Complete),
        ]
    );
}

#[test]
fn cancelling_from_another_thread_interrupts_sleep() {
    let token = CancellationToken::new();
    let runner = Runner::new().with_cancellation(token.clone());

    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(30));
        token.cancel();
    });

    let start = Instant::now();
    let result = runner.repeat(&spaced(PositiveDuration::from_secs(60)), || Ok::<_, ()>(()));
    canceller.join().unwrap();

    assert_eq!(result, Err(RunError::Cancelled));
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[test]
fn boxed_schedules_drive_like_their_source() {
    let schedules: Vec<BoxedSchedule> = vec![
        spaced(ms(1)).union(recurs(2)).boxed(),
        fibonacci(ms(1)).union(recurs(4)).boxed(),
        from_durations([ms(2), ms(4)]).boxed(),
    ];

    for schedule in &schedules {
        let sleeper = RecordingSleeper::new();
        let planned: Vec<Duration> = schedule
            .clone()
            .delays()
            .map(|d| d.as_duration())
            .collect();
        let _ = Runner::new()
            .with_sleeper(sleeper.clone())
            .retry(schedule, || Err::<(), _>("down"));
        assert_eq!(sleeper.recorded(), planned, "{:?}", schedule);
    }
}

#[tokio::test]
async fn async_retry_against_flaky_service() {
    let calls = Arc::new(AtomicU32::new(0));
    let sleeper = RecordingSleeper::new();
    let runner = AsyncRunner::from_sleeper(sleeper.clone());

    let result = runner
        .retry(&exponential(ms(1), 2.0).union(recurs(5)), || {
            let calls = Arc::clone(&calls);
            async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0..=2 => Err(FetchError::Timeout),
                    n => Ok(n),
                }
            }
        })
        .await;

    assert_eq!(result, Ok(3));
    assert_eq!(
        sleeper.recorded(),
        vec![
            Duration::from_millis(1),
            Duration::from_millis(2),
            Duration::from_millis(4)
        ]
    );
}

#[tokio::test]
async fn async_run_with_tokio_timer() {
    let start = Instant::now();
    let result = AsyncRunner::new()
        .repeat_until(
            &spaced(ms(5)).union(recurs(10)),
            {
                let count = Arc::new(AtomicU32::new(0));
                move || {
                    let count = Arc::clone(&count);
                    async move { Ok::<_, ()>(count.fetch_add(1, Ordering::SeqCst) + 1) }
                }
            },
            |n| *n >= 3,
        )
        .await;

    assert_eq!(result, Ok(3));
    assert!(start.elapsed() >= Duration::from_millis(10));
}

#[tokio::test]
async fn async_cancellation_stops_a_long_sleep() {
    let runner = AsyncRunner::new();
    let token = runner.cancellation_token().clone();

    let handle = tokio::spawn(async move {
        runner
            .retry(&spaced(PositiveDuration::from_secs(60)), || async {
                Err::<(), _>("unavailable")
            })
            .await
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    token.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("run should stop after cancellation")
        .expect("task should not panic");
    assert_eq!(result, Err(RunError::Cancelled));
}
