//! End-to-end pump scenarios: building graphs out of public nodes and
//! driving them with a `Pump` over an in-memory source, rather than
//! calling `process_self`/`flush_self` directly as the unit tests do.

use sonograph::prelude::*;

fn mono(sample_rate: f64) -> AudioFormat {
    AudioFormat::mono(sample_rate)
}

fn one_sample_per_frame(values: &[f32]) -> VecSource {
    let format = mono(8000.0);
    let frames = values
        .iter()
        .enumerate()
        .map(|(i, &v)| Frame::real(format, i as u64, vec![v]))
        .collect();
    VecSource::new(format, frames)
}

#[test]
fn sliding_window_feeds_zero_crossing_rate_once_full() {
    // §8 scenario 2: a 4-sample window of [1,-1,1,-1] has a zero
    // crossing rate of 3/4. Here the window is assembled one sample per
    // pump tick, the way a live stream would deliver it.
    let mut pump = Pump::new(one_sample_per_frame(&[1.0, -1.0, 1.0, -1.0]));
    let window = SlidingWindow::new(4, 4).unwrap();
    let aggregate = Aggregate::new(AggregateFn::ZeroCrossingRate);
    let id = aggregate.id().to_string();
    pump.add_pipeline(Pipeline::new(vec![Box::new(window), Box::new(aggregate)]));

    let outcome = pump.pump().unwrap();
    assert_eq!(outcome, PumpOutcome::Completed);

    let results = pump.results();
    let Some(Output::Frame(frame)) = results.get(&id) else {
        panic!("expected an aggregate output for id `{id}`");
    };
    assert!((frame.real_slice()[0] - 0.75).abs() < 1e-6);
}

#[test]
fn mono_downmix_averages_an_interleaved_stereo_frame() {
    // §8 "mono downmix": averaging interleaved stereo samples into one
    // channel.
    let format = AudioFormat::new(8000.0, 16, 2, Encoding::PcmSigned, Endian::Little);
    let input = Frame::real(format, 0, vec![1.0, -1.0, 0.5, 0.5]);
    let mut pump = Pump::new(VecSource::new(format, vec![input]));

    let downmix = Downmix::new();
    let aggregate = Aggregate::new(AggregateFn::Mean);
    let id = aggregate.id().to_string();
    pump.add_pipeline(Pipeline::new(vec![Box::new(downmix), Box::new(aggregate)]));
    pump.pump().unwrap();

    let results = pump.results();
    let Some(Output::Frame(frame)) = results.get(&id) else {
        panic!("expected an aggregate output for id `{id}`");
    };
    // Frame-pairs (1,-1) and (0.5,0.5) downmix to 0.0 and 0.5; their mean is 0.25.
    assert!((frame.real_slice()[0] - 0.25).abs() < 1e-6);
}

#[test]
fn decimate_by_two_halves_a_dc_stream() {
    // §8 "decimate by 2, DC input": a constant input stays constant
    // after low-pass filtering and downsampling, once the anti-aliasing
    // filter's startup transient has passed.
    let format = mono(8000.0);
    let input = Frame::real(format, 0, vec![1.0; 4000]);
    let mut pump = Pump::new(VecSource::new(format, vec![input]));

    let decimate = Decimate::new(2).unwrap();
    let id = decimate.id().to_string();
    pump.add(Frag::leaf(Box::new(decimate)));
    pump.pump().unwrap();

    let results = pump.results();
    let Some(Output::Frame(frame)) = results.get(&id) else {
        panic!("expected a decimate output for id `{id}`");
    };
    let samples = frame.real_slice();
    assert!((samples.last().copied().unwrap() - 1.0).abs() < 1e-2);
}

#[test]
fn adding_two_pipelines_sharing_a_prefix_merges_the_root() {
    let format = mono(8000.0);
    let frames: Vec<Frame> = (0..4u64).map(|i| Frame::real(format, i, vec![i as f32])).collect();
    let mut pump = Pump::new(VecSource::new(format, frames));

    pump.add_pipeline(Pipeline::new(vec![
        Box::new(Map::new(MapFn::Abs)),
        Box::new(Aggregate::new(AggregateFn::Max)),
    ]));
    pump.add_pipeline(Pipeline::new(vec![
        Box::new(Map::new(MapFn::Abs)),
        Box::new(Aggregate::new(AggregateFn::Min)),
    ]));

    assert_eq!(pump.root_count(), 1);
    pump.pump().unwrap();
    assert_eq!(pump.results().len(), 2);
}

#[test]
fn cancelling_before_pumping_returns_cancelled_with_no_results() {
    let format = mono(8000.0);
    let frames: Vec<Frame> = (0..1000u64).map(|i| Frame::real(format, i, vec![1.0])).collect();
    let mut pump = Pump::new(VecSource::new(format, frames));
    pump.add(Frag::leaf(Box::new(Aggregate::new(AggregateFn::Max))));

    let canceller = pump.canceller();
    canceller.cancel();
    let outcome = pump.pump().unwrap();
    assert_eq!(outcome, PumpOutcome::Cancelled);
}
