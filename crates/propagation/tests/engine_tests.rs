//! End-to-end engine properties: acceptance scenarios, geometric
//! invariants, and blob framing.

use std::io::Read;

use propagation::model::request_distance_azimuth;
use propagation::{
    evaluate_point, generate_map, EngineContext, MapKind, MapRequest, PathKind, SpaceWeather,
    MAP_H, MAP_W,
};

fn active_sun() -> SpaceWeather {
    SpaceWeather { ssn: 100.0, kp: 0.0, bz: 0.0, wind_speed: 400.0 }
}

fn map_request(kind: MapKind) -> MapRequest {
    MapRequest {
        width: 660,
        height: 330,
        tx_lat: 0.0,
        tx_lng: 0.0,
        mhz: 14.0,
        toa: 3.0,
        year: 2026,
        month: 2,
        utc: 12.0,
        path: PathKind::Short,
        kind,
    }
    .normalized()
}

fn inflate(blob: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    flate2::read::ZlibDecoder::new(blob).read_to_end(&mut out).unwrap();
    out
}

#[test]
fn transequatorial_midday_muf_is_open() {
    let (muf, _) =
        evaluate_point(0.0, 0.0, 10.0, 10.0, 14.0, 3.0, 2, 12.0, PathKind::Short, &active_sun());
    assert!(muf > 20.0, "expected open-band MUF, got {muf}");
}

#[test]
fn resonant_daylight_hop_is_reliable() {
    // ~2650 km lands on the single-hop skip resonance at 21 MHz.
    let (muf, rel) =
        evaluate_point(0.0, 0.0, 17.0, 17.0, 21.0, 3.0, 2, 12.0, PathKind::Short, &active_sun());
    assert!(muf > 20.0, "expected open-band MUF, got {muf}");
    assert!(rel > 0.8, "expected reliable midday hop, got {rel}");

    // The same hop goes dead when the path falls into darkness.
    let (_, rel_night) =
        evaluate_point(0.0, 0.0, 17.0, 17.0, 21.0, 3.0, 2, 0.0, PathKind::Short, &active_sun());
    assert!(rel_night < 0.1, "expected closed night path, got {rel_night}");
}

#[test]
fn polar_night_is_closed() {
    let (_, rel) = evaluate_point(
        70.0,
        20.0,
        -70.0,
        -160.0,
        28.0,
        3.0,
        2,
        0.0,
        PathKind::Short,
        &active_sun(),
    );
    assert!(rel < 0.1, "expected dead polar-night path, got {rel}");
}

#[test]
fn antipodal_receiver_evaluates_cleanly() {
    // Receiver within ~6 km of the exact antipode of the transmitter.
    let (muf, rel) = evaluate_point(
        45.0,
        -75.0,
        -45.05,
        105.0,
        14.0,
        3.0,
        2,
        12.0,
        PathKind::Short,
        &active_sun(),
    );
    assert!(muf.is_finite() && rel.is_finite());
    assert!((0.0..=1.0).contains(&rel));
}

#[test]
fn long_path_mirrors_short_path() {
    let tx = (10.0_f64.to_radians(), 20.0_f64.to_radians());
    let rx = (-30.0_f64.to_radians(), 150.0_f64.to_radians());
    let (d_short, az_short) = request_distance_azimuth(tx.0, tx.1, rx.0, rx.1, false);
    let (d_long, az_long) = request_distance_azimuth(tx.0, tx.1, rx.0, rx.1, true);

    let circumference = 2.0 * std::f64::consts::PI * 6371.0;
    assert!((d_short + d_long - circumference).abs() < 1.0);

    let mut diff = (az_long - az_short).abs();
    if diff > std::f64::consts::PI {
        diff = 2.0 * std::f64::consts::PI - diff;
    }
    assert!((diff - std::f64::consts::PI).abs() < 1.0_f64.to_radians());
}

#[test]
fn rendered_blobs_have_exact_framing() {
    let ctx = EngineContext::bare();
    let req = map_request(MapKind::Reliability);
    let blobs = generate_map(&ctx, &req, &active_sun());

    for blob in [&blobs.primary, &blobs.dimmed] {
        let raw = inflate(blob);
        assert_eq!(&raw[..2], b"BM");
        assert_eq!(raw.len(), 122 + MAP_W * MAP_H * 2);
        assert_eq!(&raw[..122], &codecs::bmp565_header(660, 330)[..]);
    }
}

#[test]
fn resized_blob_matches_requested_dimensions() {
    let ctx = EngineContext::bare();
    let mut req = map_request(MapKind::Muf);
    req.width = 330;
    req.height = 165;
    let blobs = generate_map(&ctx, &req, &active_sun());
    let raw = inflate(&blobs.primary);
    assert_eq!(raw.len(), 122 + 330 * 165 * 2);
}

#[test]
fn identical_requests_render_identical_bytes() {
    let ctx = EngineContext::bare();
    let wx = active_sun();

    let mut a = map_request(MapKind::Reliability);
    a.tx_lat = 45.001;
    let mut b = map_request(MapKind::Reliability);
    b.tx_lat = 45.0012;
    let (a, b) = (a.normalized(), b.normalized());

    // Sub-centidegree latitude differences quantise away entirely.
    assert_eq!(a.fingerprint(), b.fingerprint());
    let blobs_a = generate_map(&ctx, &a, &wx);
    let blobs_b = generate_map(&ctx, &b, &wx);
    assert_eq!(blobs_a.primary, blobs_b.primary);
    assert_eq!(blobs_a.dimmed, blobs_b.dimmed);
}

#[test]
fn no_seam_at_the_antimeridian() {
    use propagation::grid::{evaluate_grid, smooth_wrapped};
    use propagation::model::{PathInputs, TxSite};

    let ctx = EngineContext::bare();
    let wx = active_sun();
    let inp = PathInputs::new(2, 12.0, &wx, 14.0, 3.0, false);
    let tx = TxSite::new(0.0, 0.0, &inp);
    let field = evaluate_grid(&ctx, &inp, &tx);
    let smoothed = smooth_wrapped(&field.rel);

    for y in 0..MAP_H {
        let west = smoothed[y * MAP_W];
        let east = smoothed[y * MAP_W + MAP_W - 1];
        assert!(
            (west - east).abs() < 0.05,
            "seam at row {y}: {west} vs {east}"
        );
    }
}

#[test]
fn dimmed_copy_is_darker() {
    let ctx = EngineContext::bare();
    let req = map_request(MapKind::Muf);
    let blobs = generate_map(&ctx, &req, &active_sun());
    let primary = inflate(&blobs.primary);
    let dimmed = inflate(&blobs.dimmed);

    let lum = |raw: &[u8]| -> u64 {
        raw[122..]
            .chunks_exact(2)
            .map(|c| {
                let p = u16::from_le_bytes([c[0], c[1]]);
                let (r, g, b) = codecs::unpack_rgb565(p);
                r as u64 + g as u64 + b as u64
            })
            .sum()
    };
    assert!(lum(&dimmed) <= lum(&primary));
}
