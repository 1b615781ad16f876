use lightbrush::kernel::{self, KernelParams};
use lightbrush::{
    Frame, FramePlugin, LightBrush, ParamValue, Plane, PluginError, SoftwareBackend, Variant,
    Viewport, OPAQUE_BLACK, ZERO,
};

fn brush(variant: Variant, viewport: Viewport) -> LightBrush<SoftwareBackend> {
    let mut brush = LightBrush::new(SoftwareBackend::new(), variant);
    brush.initialize(viewport).unwrap();
    brush
}

fn set_floats(brush: &mut LightBrush<SoftwareBackend>, threshold: f32, darkening: f32) {
    brush.set_parameter(0, ParamValue::Float(threshold)).unwrap();
    brush.set_parameter(1, ParamValue::Float(darkening)).unwrap();
}

fn run(brush: &mut LightBrush<SoftwareBackend>, input: &Frame) -> Frame {
    let viewport = brush.viewport().unwrap();
    let mut output = Frame::filled(viewport, [0.5; 4]);
    brush.process_frame(&[Some(input)], &mut output).unwrap();
    output
}

/// Deterministic frame with a mix of bright and dim pixels.
fn gradient(viewport: Viewport, phase: u32) -> Frame {
    let mut frame = Frame::filled(viewport, ZERO);
    for y in 0..viewport.height {
        for x in 0..viewport.width {
            let t = ((x * 7 + y * 3 + phase * 5) % 16) as f32 / 15.0;
            frame.set(x, y, [t, 1.0 - t, t * t, 1.0]);
        }
    }
    frame
}

fn assert_rgb_black(frame: &Frame) {
    for (index, sample) in frame.samples().iter().enumerate() {
        assert_eq!(&sample[..3], &[0.0, 0.0, 0.0], "pixel {index} is {sample:?}");
    }
}

#[test]
fn bright_input_yields_brighter_of_input_and_state() {
    let viewport = Viewport::new(3, 2);
    let mut brush = brush(Variant::Simple, viewport);
    set_floats(&mut brush, 0.5, 0.3);

    let white = Frame::filled(viewport, [1.0, 1.0, 1.0, 1.0]);
    run(&mut brush, &white);

    // State is now white; a bright but dimmer input loses to it.
    let grey = Frame::filled(viewport, [0.6, 0.6, 0.6, 1.0]);
    let output = run(&mut brush, &grey);
    assert_eq!(output, white);

    // A brighter input wins.
    let mut brush = self::brush(Variant::Simple, viewport);
    set_floats(&mut brush, 0.5, 0.3);
    run(&mut brush, &grey);
    let output = run(&mut brush, &white);
    assert_eq!(output, white);
}

#[test]
fn dim_frames_darken_input_independent_of_state() {
    let viewport = Viewport::new(2, 2);
    let dim = Frame::filled(viewport, [0.2, 0.1, 0.4, 1.0]);
    let expected = Frame::filled(viewport, [0.1, 0.05, 0.2, 1.0]);

    for warmup in [0.0f32, 0.2, 0.3] {
        let mut brush = brush(Variant::Simple, viewport);
        set_floats(&mut brush, 0.9, 0.5);
        run(&mut brush, &Frame::filled(viewport, [warmup, warmup, warmup, 1.0]));
        let output = run(&mut brush, &dim);
        for (actual, wanted) in output.samples().iter().zip(expected.samples()) {
            for channel in 0..4 {
                assert!((actual[channel] - wanted[channel]).abs() < 1e-6);
            }
        }
    }
}

#[test]
fn clear_is_idempotent_and_black_input_stays_black() {
    let viewport = Viewport::new(4, 3);
    for variant in [Variant::Simple, Variant::Advanced] {
        let mut brush = brush(variant, viewport);
        run(&mut brush, &gradient(viewport, 1));
        run(&mut brush, &gradient(viewport, 2));

        brush.clear().unwrap();
        let once = brush.backend().current_color().unwrap().clone();
        brush.clear().unwrap();
        assert_eq!(brush.backend().current_color().unwrap(), &once);
        assert_eq!(once, Frame::filled(viewport, ZERO));

        let black = Frame::filled(viewport, OPAQUE_BLACK);
        for _ in 0..3 {
            let output = run(&mut brush, &black);
            assert_rgb_black(&output);
        }
    }
}

#[test]
fn clear_event_parameter_resets_canvas() {
    let viewport = Viewport::new(2, 2);
    let mut brush = brush(Variant::Advanced, viewport);
    run(&mut brush, &Frame::filled(viewport, [1.0; 4]));

    brush.set_parameter(2, ParamValue::Bool(true)).unwrap();
    assert_eq!(
        brush.backend().current_color().unwrap(),
        &Frame::filled(viewport, ZERO)
    );
    assert!(brush
        .backend()
        .current_velocity()
        .unwrap()
        .samples()
        .iter()
        .all(|v| *v == 0.0));
}

#[test]
fn current_buffer_holds_last_output() {
    let viewport = Viewport::new(5, 4);
    for variant in [Variant::Simple, Variant::Advanced] {
        let mut brush = brush(variant, viewport);
        assert_eq!(
            brush.backend().current_color().unwrap(),
            &Frame::filled(viewport, ZERO)
        );

        for frame in 0..6 {
            let output = run(&mut brush, &gradient(viewport, frame));
            assert_eq!(brush.backend().current_color().unwrap(), &output);
        }
        assert_eq!(brush.frame_count(), 6);
    }
}

#[test]
fn output_dimensions_match_viewport() {
    let viewport = Viewport::new(4, 4);
    let mut brush = brush(Variant::Simple, viewport);
    set_floats(&mut brush, 0.9, 0.5);

    let output = run(&mut brush, &Frame::filled(viewport, OPAQUE_BLACK));
    assert_eq!(output.viewport(), viewport);
    assert_rgb_black(&output);
}

#[test]
fn reinitialise_allocates_fresh_buffers() {
    let mut brush = brush(Variant::Advanced, Viewport::new(8, 8));
    run(&mut brush, &Frame::filled(Viewport::new(8, 8), [1.0; 4]));
    run(&mut brush, &gradient(Viewport::new(8, 8), 3));

    let small = Viewport::new(4, 4);
    brush.initialize(small).unwrap();
    assert_eq!(brush.frame_count(), 0);
    assert_eq!(brush.backend().viewport(), Some(small));
    assert_eq!(
        brush.backend().current_color().unwrap(),
        &Frame::filled(small, ZERO)
    );
    assert_eq!(
        brush.backend().current_velocity().unwrap(),
        &Plane::filled(small, 0.0)
    );

    let output = run(&mut brush, &Frame::filled(small, OPAQUE_BLACK));
    assert_eq!(output.viewport(), small);
}

#[test]
fn velocity_pass_ignores_the_buffer_it_writes() {
    let viewport = Viewport::new(3, 3);
    let input = gradient(viewport, 4);
    let state = gradient(viewport, 9);
    let prior = Plane::filled(viewport, 0.25);

    let mut first = Plane::filled(viewport, 0.0);
    let mut second = Plane::filled(viewport, 123.0);
    kernel::velocity_pass(&input, &state, &prior, &mut first);
    kernel::velocity_pass(&input, &state, &prior, &mut second);
    assert_eq!(first, second);

    // Pass B reading a different velocity leaves Pass A's result untouched.
    let params = KernelParams {
        threshold: 0.95,
        darkening: 0.95,
    };
    let mut color = Frame::filled(viewport, ZERO);
    kernel::color_pass(&input, &state, &Plane::filled(viewport, -1.0), params, &mut color);
    let mut again = Plane::filled(viewport, 0.0);
    kernel::velocity_pass(&input, &state, &prior, &mut again);
    assert_eq!(first, again);
}

#[test]
fn rejected_frame_keeps_previous_state() {
    let viewport = Viewport::new(2, 2);
    let mut brush = brush(Variant::Advanced, viewport);
    let first = run(&mut brush, &gradient(viewport, 0));
    let velocity = brush.backend().current_velocity().unwrap().clone();

    let input = gradient(viewport, 5);
    let mut wrong = Frame::filled(Viewport::new(3, 2), ZERO);
    let err = brush
        .process_frame(&[Some(&input)], &mut wrong)
        .unwrap_err();
    assert!(matches!(err, PluginError::OutputMismatch { .. }));
    assert!(!err.is_fatal());

    let mut output = Frame::filled(viewport, ZERO);
    assert!(matches!(
        brush.process_frame(&[], &mut output),
        Err(PluginError::MissingInput)
    ));
    assert!(matches!(
        brush.process_frame(&[None], &mut output),
        Err(PluginError::InvalidInput)
    ));

    assert_eq!(brush.frame_count(), 1);
    assert_eq!(brush.backend().current_color().unwrap(), &first);
    assert_eq!(brush.backend().current_velocity().unwrap(), &velocity);
}

#[test]
fn trails_fade_after_the_light_moves_on() {
    let viewport = Viewport::new(4, 1);
    let mut brush = brush(Variant::Advanced, viewport);
    set_floats(&mut brush, 0.5, 0.5);

    let mut lit = Frame::filled(viewport, OPAQUE_BLACK);
    lit.set(1, 0, [1.0, 1.0, 1.0, 1.0]);
    let output = run(&mut brush, &lit);
    assert_eq!(output.get(1, 0), Some([1.0, 1.0, 1.0, 1.0]));

    let dark = Frame::filled(viewport, OPAQUE_BLACK);
    let mut previous = 1.0;
    for _ in 0..4 {
        let output = run(&mut brush, &dark);
        let red = output.get(1, 0).unwrap()[0];
        assert!(red < previous, "trail did not fade: {red} >= {previous}");
        assert!(red > 0.0);
        previous = red;
    }
}
