// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for host status parsing and the SGD settings codec.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use zebralink_core::types::{PrinterSettings, Setting};
use zebralink_print::{settings, status};

fn host_status_reply() -> Vec<u8> {
    b"\x02030,0,1,1245,003,0,0,0,000,0,0,0\x03\r\n\
      \x02000,0,1,0,1,2,6,0,00000012,1,000\x03\r\n\
      \x021234,0\x03\r\n"
        .to_vec()
}

fn full_settings() -> PrinterSettings {
    let mut s = PrinterSettings::new()
        .with(Setting::Darkness, 10.0)
        .with(Setting::PrintSpeed, 4.0)
        .with(Setting::TearOff, 0.0)
        .with(Setting::MediaType, "gap")
        .with(Setting::PrintMethod, "direct thermal")
        .with(Setting::PrintWidth, 812.0)
        .with(Setting::LabelLength, 1218.0)
        .with(Setting::PrintMode, "tear off")
        .with(Setting::ZplMode, "zpl II")
        .with(Setting::PowerUpAction, "no motion")
        .with(Setting::HeadCloseAction, "feed")
        .with(Setting::LabelTop, 0.0)
        .with(Setting::LeftPosition, 0.0)
        .with(Setting::ReprintMode, "off")
        .with(Setting::VirtualDevice, "hybrid_xml_zpl");
    s.set_raw("media.sense_mode", "gap");
    s.set_raw("bluetooth.friendly_name", "Dock 4");
    s
}

fn bench_parse_host_status(c: &mut Criterion) {
    let reply = host_status_reply();
    c.bench_function("parse_host_status", |b| {
        b.iter(|| {
            let result = status::parse_host_status(black_box(&reply));
            assert!(result.is_ok());
        });
    });
}

fn bench_encode_settings(c: &mut Criterion) {
    let s = full_settings();
    c.bench_function("settings encode (17 keys)", |b| {
        b.iter(|| settings::encode(black_box(&s)));
    });
}

fn bench_decode_settings(c: &mut Criterion) {
    let encoded = settings::encode(&full_settings()).expect("bench settings are encodable");
    c.bench_function("settings decode (17 setvar lines)", |b| {
        b.iter(|| {
            let result = settings::decode(black_box(&encoded));
            assert!(result.is_ok());
        });
    });

    let dump = b"print.tone : 10.0 , Choices: 0.0-30.0\r\n\
                 media.speed : 4.0 , Choices: 2.0-6.0\r\n\
                 ezpl.media_type : gap , Choices: continuous,gap/notch,mark\r\n\
                 zpl.reprint_mode : ? , Choices: on,off\r\n\
                 device.friendly_name : \"XXZQ5\"\r\n";
    c.bench_function("settings decode (dump lines)", |b| {
        b.iter(|| settings::decode(black_box(dump)));
    });
}

criterion_group!(
    benches,
    bench_parse_host_status,
    bench_encode_settings,
    bench_decode_settings,
);
criterion_main!(benches);
