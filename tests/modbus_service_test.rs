// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Tests for the RegisterMapService implementation
//!
//! Requests are fed straight into the `tokio_modbus` service, so no serial
//! port is needed. A mocked observer checks which writes and reads are
//! reported.

use std::borrow::Cow;
use std::sync::Arc;

use mockall::predicate::eq;
use mockall::{mock, Sequence};
use tokio_modbus::prelude::*;
use tokio_modbus::server::Service;

use rust_modbus_sim::modbus::RegisterMapService;
use rust_modbus_sim::register_map::{
    compile, EncodingConfig, RawRow, SharedRegisterMap, WriteAttempt, WriteObserver,
};

mock! {
    pub Observer {}

    impl WriteObserver for Observer {
        fn on_write_attempt(&self, attempt: &WriteAttempt);
        fn on_read(&self, address: u16, count: u16);
    }
}

const SLAVE: u8 = 3;

fn inverter_map() -> SharedRegisterMap {
    let rows = [
        RawRow::new("40001", "uint16", "1234"),
        RawRow::new("120", "ascii", "INVERTER-A").with_len("10"),
        RawRow::new("40100", "uint32", "305419896").with_order_code("ABCD"),
    ];
    SharedRegisterMap::new(compile(&rows, &EncodingConfig::default()).unwrap())
}

fn request(slave: u8, request: Request<'static>) -> SlaveRequest<'static> {
    SlaveRequest { slave, request }
}

#[tokio::test]
async fn test_read_holding_registers() {
    let mut observer = MockObserver::new();
    observer
        .expect_on_read()
        .with(eq(99), eq(2))
        .times(1)
        .return_const(());
    observer.expect_on_write_attempt().never();

    let service = RegisterMapService::new(inverter_map(), SLAVE, false)
        .with_observer(Arc::new(observer));

    let response = service
        .call(request(SLAVE, Request::ReadHoldingRegisters(99, 2)))
        .await
        .unwrap();
    assert_eq!(
        response,
        Some(Response::ReadHoldingRegisters(vec![0x1234, 0x5678]))
    );
}

#[tokio::test]
async fn test_gap_policy_exceptions() {
    let lenient = RegisterMapService::new(inverter_map(), SLAVE, false);
    let strict = RegisterMapService::new(inverter_map(), SLAVE, true);

    assert_eq!(
        lenient
            .call(request(SLAVE, Request::ReadHoldingRegisters(124, 2)))
            .await,
        Ok(Some(Response::ReadHoldingRegisters(vec![0x2D41, 0])))
    );
    assert_eq!(
        strict
            .call(request(SLAVE, Request::ReadHoldingRegisters(124, 2)))
            .await,
        Err(ExceptionCode::IllegalDataAddress)
    );
    assert_eq!(
        strict
            .call(request(SLAVE, Request::ReadHoldingRegisters(0, 0)))
            .await,
        Err(ExceptionCode::IllegalDataValue)
    );
    assert_eq!(
        lenient
            .call(request(SLAVE, Request::ReadHoldingRegisters(0xFFFF, 2)))
            .await,
        Err(ExceptionCode::IllegalDataAddress)
    );
}

#[tokio::test]
async fn test_writes_are_observed_and_ignored() {
    let mut observer = MockObserver::new();
    let mut seq = Sequence::new();
    observer
        .expect_on_write_attempt()
        .withf(|a| a.function_code == 0x06 && a.address == 0 && a.values == [42])
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    observer
        .expect_on_write_attempt()
        .withf(|a| a.function_code == 0x10 && a.address == 120 && a.values == [1, 2, 3])
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    observer
        .expect_on_write_attempt()
        .withf(|a| a.function_code == 0x16 && a.values == [0x00FF, 0x0F00])
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    observer
        .expect_on_write_attempt()
        .withf(|a| a.function_code == 0x17 && a.address == 5 && a.values == [9])
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    observer.expect_on_read().return_const(());

    let map = inverter_map();
    let service =
        RegisterMapService::new(map.clone(), SLAVE, false).with_observer(Arc::new(observer));

    assert_eq!(
        service
            .call(request(SLAVE, Request::WriteSingleRegister(0, 42)))
            .await,
        Ok(Some(Response::WriteSingleRegister(0, 42)))
    );
    assert_eq!(
        service
            .call(request(
                SLAVE,
                Request::WriteMultipleRegisters(120, Cow::Owned(vec![1, 2, 3]))
            ))
            .await,
        Ok(Some(Response::WriteMultipleRegisters(120, 3)))
    );
    assert_eq!(
        service
            .call(request(SLAVE, Request::MaskWriteRegister(1, 0x00FF, 0x0F00)))
            .await,
        Ok(Some(Response::MaskWriteRegister(1, 0x00FF, 0x0F00)))
    );
    assert_eq!(
        service
            .call(request(
                SLAVE,
                Request::ReadWriteMultipleRegisters(0, 1, 5, Cow::Owned(vec![9]))
            ))
            .await,
        Ok(Some(Response::ReadWriteMultipleRegisters(vec![1234])))
    );

    let current = map.current();
    assert_eq!(current.get(0), Some(1234));
    assert_eq!(current.get(120), Some(0x494E));
    assert_eq!(current.get(5), None);
}

#[tokio::test]
async fn test_other_units_and_broadcasts() {
    let mut observer = MockObserver::new();
    observer
        .expect_on_write_attempt()
        .withf(|a| a.address == 7)
        .times(1)
        .return_const(());
    observer.expect_on_read().never();

    let service = RegisterMapService::new(inverter_map(), SLAVE, false)
        .with_observer(Arc::new(observer));

    // another slave on the bus
    assert_eq!(
        service
            .call(request(SLAVE + 1, Request::ReadHoldingRegisters(0, 1)))
            .await,
        Ok(None)
    );
    assert_eq!(
        service
            .call(request(SLAVE + 1, Request::WriteSingleRegister(1, 1)))
            .await,
        Ok(None)
    );

    // broadcast write: observed, never answered
    assert_eq!(
        service
            .call(request(0, Request::WriteSingleRegister(7, 1)))
            .await,
        Ok(None)
    );
}

#[tokio::test]
async fn test_unsupported_functions() {
    let service = RegisterMapService::new(inverter_map(), SLAVE, false);
    for req in [
        Request::ReadCoils(0, 1),
        Request::ReadInputRegisters(0, 1),
        Request::WriteSingleCoil(0, true),
    ] {
        assert_eq!(
            service.call(request(SLAVE, req)).await,
            Err(ExceptionCode::IllegalFunction)
        );
    }
}

#[tokio::test]
async fn test_reload_is_visible_to_service() {
    let map = inverter_map();
    let service = RegisterMapService::new(map.clone(), SLAVE, true);

    map.replace(
        compile(
            &[RawRow::new("0", "int16", "-1")],
            &EncodingConfig::default(),
        )
        .unwrap(),
    );

    assert_eq!(
        service
            .call(request(SLAVE, Request::ReadHoldingRegisters(0, 1)))
            .await,
        Ok(Some(Response::ReadHoldingRegisters(vec![0xFFFF])))
    );
    assert_eq!(
        service
            .call(request(SLAVE, Request::ReadHoldingRegisters(99, 1)))
            .await,
        Err(ExceptionCode::IllegalDataAddress)
    );
}
