use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use approx::assert_relative_eq;

use super::*;
use crate::p835::Profile;

const RAIN: f64 = 6.;
const GAS: f64 = 0.4;
const CLOUD: f64 = 1.5;
const SCINTILLATION: f64 = 0.8;

/// Fixed-output models that record how they were called.
#[derive(Default)]
struct Recorder {
    calls: AtomicUsize,
    rain: Mutex<Vec<RainQuery>>,
    gas: Mutex<Vec<GasQuery>>,
    cloud: Mutex<Vec<CloudQuery>>,
    scintillation: Mutex<Vec<ScintillationQuery>>,
    vapour: Mutex<Vec<(f64, f64, f64, f64)>>,
}

impl Recorder {
    fn record<T>(&self, log: &Mutex<Vec<T>>, value: T) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        log.lock().unwrap().push(value);
    }
}

impl RainAttenuation for Recorder {
    fn rain_attenuation(&self, query: &RainQuery) -> f64 {
        self.record(&self.rain, *query);
        RAIN
    }
}

impl GaseousAttenuation for Recorder {
    fn gaseous_attenuation(&self, query: &GasQuery) -> f64 {
        self.record(&self.gas, *query);
        GAS
    }
}

impl CloudAttenuation for Recorder {
    fn cloud_attenuation(&self, query: &CloudQuery) -> f64 {
        self.record(&self.cloud, *query);
        CLOUD
    }
}

impl ScintillationAttenuation for Recorder {
    fn scintillation_attenuation(&self, query: &ScintillationQuery) -> f64 {
        self.record(&self.scintillation, *query);
        SCINTILLATION
    }
}

impl SurfaceWaterVapourDensity for Recorder {
    fn surface_water_vapour_density(&self, lat: f64, lon: f64, p: f64, hs: f64) -> f64 {
        self.record(&self.vapour, (lat, lon, p, hs));
        12.5
    }
}

fn altitude(_lat: f64, _lon: f64) -> f64 {
    0.25
}

fn mean_temperature(_lat: f64, _lon: f64) -> f64 {
    290.
}

fn models(recorder: &Recorder) -> PropagationModels<'_> {
    PropagationModels {
        topographic_altitude: &altitude,
        surface_mean_temperature: &mean_temperature,
        surface_water_vapour_density: recorder,
        rain: recorder,
        gas: recorder,
        cloud: recorder,
        scintillation: recorder,
    }
}

fn contributions(result: SlantPathAttenuation) -> AttenuationContributions {
    match result {
        SlantPathAttenuation::Contributions(contributions) => contributions,
        SlantPathAttenuation::Total(_) => panic!("expected contributions"),
    }
}

#[test]
fn combines_all_contributions() {
    let recorder = Recorder::default();
    let options = SlantPathOptions {
        return_contributions: true,
        ..Default::default()
    };
    let result =
        atmospheric_attenuation_slant_path(&models(&recorder), 51.5, -0.14, 31., 14.25, 1., 1.2, &options)
            .unwrap();
    let result = contributions(result);

    assert_eq!(result.gas.as_scalar(), Some(GAS));
    assert_eq!(result.cloud.as_scalar(), Some(CLOUD));
    assert_eq!(result.rain.as_scalar(), Some(RAIN));
    assert_eq!(result.scintillation.as_scalar(), Some(SCINTILLATION));
    assert_eq!(result.total.unit(), Some(Unit::Decibel));
    assert_relative_eq!(
        result.total.as_scalar().unwrap(),
        GAS + f64::sqrt((RAIN + CLOUD).powi(2) + SCINTILLATION.powi(2))
    );
}

#[test]
fn only_the_total_by_default() {
    let recorder = Recorder::default();
    let result = atmospheric_attenuation_slant_path(
        &models(&recorder),
        51.5,
        -0.14,
        31.,
        14.25,
        1.,
        1.2,
        &SlantPathOptions::default(),
    )
    .unwrap();
    assert!(matches!(result, SlantPathAttenuation::Total(_)));
    assert_relative_eq!(
        result.total().as_scalar().unwrap(),
        combine_contributions(GAS, CLOUD, RAIN, SCINTILLATION)
    );
}

#[test]
fn everything_excluded_is_zero() {
    let recorder = Recorder::default();
    let options = SlantPathOptions {
        include_rain: false,
        include_gas: false,
        include_scintillation: false,
        include_clouds: false,
        return_contributions: true,
        ..Default::default()
    };
    let result = contributions(
        atmospheric_attenuation_slant_path(&models(&recorder), 10., 20., 45., 20., 0.1, 1., &options)
            .unwrap(),
    );
    assert_eq!(result.total.as_scalar(), Some(0.));
    assert_eq!(result.gas.as_scalar(), Some(0.));
    assert_eq!(result.cloud.as_scalar(), Some(0.));
    assert_eq!(result.rain.as_scalar(), Some(0.));
    assert_eq!(result.scintillation.as_scalar(), Some(0.));

    // Only the water vapour lookup ran
    assert_eq!(recorder.calls.load(Ordering::Relaxed), 1);
    assert!(recorder.rain.lock().unwrap().is_empty());
}

#[test]
fn without_gas_is_the_quadrature_sum() {
    let recorder = Recorder::default();
    let options = SlantPathOptions {
        include_gas: false,
        ..Default::default()
    };
    let total = atmospheric_attenuation_slant_path(&models(&recorder), 10., 20., 45., 20., 0.1, 1., &options)
        .unwrap();
    assert_eq!(
        total.total().as_scalar().unwrap(),
        f64::sqrt((RAIN + CLOUD).powi(2) + SCINTILLATION.powi(2))
    );
    assert!(recorder.gas.lock().unwrap().is_empty());
}

#[test]
fn cloud_and_gas_use_at_least_one_percent() {
    for (p, expected) in [(0.01, 1.), (0.5, 1.), (1., 1.), (5., 5.)] {
        let recorder = Recorder::default();
        atmospheric_attenuation_slant_path(
            &models(&recorder),
            30.,
            0.,
            40.,
            30.,
            p,
            2.,
            &SlantPathOptions::default(),
        )
        .unwrap();

        assert_eq!(recorder.cloud.lock().unwrap()[0].p, expected);
        assert_eq!(recorder.gas.lock().unwrap()[0].p, expected);
        // Rain, scintillation and the vapour lookup see the requested value
        assert_eq!(recorder.rain.lock().unwrap()[0].p, p);
        assert_eq!(recorder.scintillation.lock().unwrap()[0].p, p);
        assert_eq!(recorder.vapour.lock().unwrap()[0].2, p);
    }
}

#[test]
fn surface_parameters_are_looked_up() {
    let recorder = Recorder::default();
    atmospheric_attenuation_slant_path(
        &models(&recorder),
        30.,
        15.,
        40.,
        30.,
        0.1,
        2.,
        &SlantPathOptions::default(),
    )
    .unwrap();

    let expected_pressure = Profile::MidSummer.pressure(0.25);
    let gas = recorder.gas.lock().unwrap()[0];
    assert_eq!(gas.rho, 12.5);
    assert_eq!(gas.t, 290.);
    assert_eq!(gas.p_surface, expected_pressure);
    assert_eq!(gas.mode, GasMode::Approx);

    let rain = recorder.rain.lock().unwrap()[0];
    assert_eq!(rain.hs, 0.25);
    assert_eq!(rain.tau, 45.);
    assert_eq!(rain.r001, None);

    let scintillation = recorder.scintillation.lock().unwrap()[0];
    assert_eq!(scintillation.t, 290.);
    assert_eq!(scintillation.p_surface, expected_pressure);
    assert_eq!(scintillation.h_l, 1000.);
    assert_eq!(scintillation.eta, 0.5);
    assert_eq!(scintillation.d, 2.);

    assert_eq!(recorder.vapour.lock().unwrap()[0], (30., 15., 0.1, 0.25));
}

#[test]
fn supplied_surface_parameters_are_used() {
    let recorder = Recorder::default();
    let options = SlantPathOptions {
        hs: Some(Quantity::new(1200., Unit::Metre)),
        rho: Some(7.5.into()),
        t: Some(Quantity::new(20., Unit::Celsius)),
        p_surface: Some(Quantity::new(95_000., Unit::Pascal)),
        r001: Some(Quantity::new(42., Unit::MillimetrePerHour)),
        h: Some(60.0.into()),
        ls: Some(3.0.into()),
        mode: GasMode::Exact,
        ..Default::default()
    };
    let models = PropagationModels {
        topographic_altitude: &|_: f64, _: f64| -> f64 { panic!("altitude was supplied") },
        surface_mean_temperature: &|_: f64, _: f64| -> f64 { panic!("temperature was supplied") },
        ..models(&recorder)
    };
    atmospheric_attenuation_slant_path(&models, 30., 15., 40., 30., 0.1, 2., &options).unwrap();

    // The vapour density was supplied, so it wasn't looked up
    assert!(recorder.vapour.lock().unwrap().is_empty());

    let gas = recorder.gas.lock().unwrap()[0];
    assert_eq!(gas.rho, 7.5);
    assert_relative_eq!(gas.t, 293.15, max_relative = 1e-12);
    assert_relative_eq!(gas.p_surface, 950., max_relative = 1e-12);
    assert_eq!(gas.mode, GasMode::Exact);

    let rain = recorder.rain.lock().unwrap()[0];
    assert_relative_eq!(rain.hs, 1.2, max_relative = 1e-12);
    assert_eq!(rain.r001, Some(42.));
    assert_eq!(rain.ls, Some(3.));

    let scintillation = recorder.scintillation.lock().unwrap()[0];
    assert_eq!(scintillation.h, Some(60.));
}

#[test]
fn out_of_range_probability_still_computes() {
    let recorder = Recorder::default();
    let total = atmospheric_attenuation_slant_path(
        &models(&recorder),
        30.,
        15.,
        40.,
        30.,
        60.,
        2.,
        &SlantPathOptions::default(),
    )
    .unwrap();
    assert_relative_eq!(
        total.total().as_scalar().unwrap(),
        combine_contributions(GAS, CLOUD, RAIN, SCINTILLATION)
    );
    assert_eq!(recorder.rain.lock().unwrap()[0].p, 60.);
}

#[test]
fn mismatched_units_fail_before_any_model_runs() {
    let recorder = Recorder::default();
    let err = atmospheric_attenuation_slant_path(
        &models(&recorder),
        30.,
        15.,
        40.,
        Quantity::new(30., Unit::Kelvin),
        1.,
        2.,
        &SlantPathOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        AtmosError::UnitMismatch {
            name: "Frequency",
            expected: Unit::GigaHertz,
            found: Unit::Kelvin,
        }
    );

    let options = SlantPathOptions {
        tau: Quantity::new(45., Unit::Metre),
        ..Default::default()
    };
    let err = atmospheric_attenuation_slant_path(&models(&recorder), 30., 15., 40., 30., 1., 2., &options)
        .unwrap_err();
    assert!(matches!(err, AtmosError::UnitMismatch { name: "Polarization tilt angle", .. }));

    assert_eq!(recorder.calls.load(Ordering::Relaxed), 0);
}

#[test]
fn tagged_link_parameters_are_converted() {
    let recorder = Recorder::default();
    atmospheric_attenuation_slant_path(
        &models(&recorder),
        30.,
        15.,
        Quantity::new(std::f64::consts::FRAC_PI_4, Unit::Radian),
        Quantity::new(14_250., Unit::MegaHertz),
        1.,
        2.,
        &SlantPathOptions::default(),
    )
    .unwrap();

    let cloud = recorder.cloud.lock().unwrap()[0];
    assert_relative_eq!(cloud.el, 45., max_relative = 1e-12);
    assert_relative_eq!(cloud.f, 14.25, max_relative = 1e-12);
}

#[test]
fn vector_inputs_are_evaluated_per_site() {
    let rain = |q: &RainQuery| q.lat.abs() / 10.;
    let gas = |q: &GasQuery| q.f / 100.;
    let cloud = |q: &CloudQuery| q.el / 100.;
    let scintillation = |q: &ScintillationQuery| q.d;
    let vapour = |_: f64, _: f64, _: f64, _: f64| 10.;
    let models = PropagationModels {
        topographic_altitude: &altitude,
        surface_mean_temperature: &mean_temperature,
        surface_water_vapour_density: &vapour,
        rain: &rain,
        gas: &gas,
        cloud: &cloud,
        scintillation: &scintillation,
    };
    let options = SlantPathOptions {
        return_contributions: true,
        num_threads: Some(2),
        ..Default::default()
    };

    let lat = vec![10., -30., 60., 5.];
    let el = [20., 30., 40., 50.];
    let result = contributions(
        atmospheric_attenuation_slant_path_with(
            &ModelContext::default(),
            &models,
            lat.clone(),
            0.,
            el,
            12.,
            0.5,
            [1., 2., 3., 4.],
            &options,
        )
        .unwrap(),
    );

    assert_eq!(result.total.len(), 4);
    for (i, (lat, el)) in lat.iter().zip(el).enumerate() {
        let d = (i + 1) as f64;
        let expected = combine_contributions(0.12, el / 100., lat.abs() / 10., d);
        assert_relative_eq!(result.total.values()[i], expected);
        assert_eq!(result.rain.values()[i], lat.abs() / 10.);
        assert_eq!(result.scintillation.values()[i], d);
    }
}

#[test]
fn vector_inputs_must_broadcast() {
    let recorder = Recorder::default();
    let err = atmospheric_attenuation_slant_path(
        &models(&recorder),
        [10., 20., 30.],
        [0., 1.],
        40.,
        30.,
        1.,
        2.,
        &SlantPathOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err, AtmosError::InconsistentInputs);

    let options = SlantPathOptions {
        hs: Some(vec![0.1, 0.2].into()),
        ..Default::default()
    };
    let err = atmospheric_attenuation_slant_path(
        &models(&recorder),
        [10., 20., 30.],
        0.,
        40.,
        30.,
        1.,
        2.,
        &options,
    )
    .unwrap_err();
    assert_eq!(err, AtmosError::InconsistentInputs);
    assert_eq!(recorder.calls.load(Ordering::Relaxed), 0);
}

#[test]
fn empty_site_list_gives_empty_result() {
    let recorder = Recorder::default();
    let options = SlantPathOptions {
        return_contributions: true,
        ..Default::default()
    };
    let result = contributions(
        atmospheric_attenuation_slant_path(
            &models(&recorder),
            Vec::<f64>::new(),
            0.,
            40.,
            30.,
            1.,
            2.,
            &options,
        )
        .unwrap(),
    );
    assert!(result.total.is_empty());
    assert!(result.rain.is_empty());
    assert_eq!(result.total.unit(), Some(Unit::Decibel));
    assert_eq!(recorder.calls.load(Ordering::Relaxed), 0);
}
