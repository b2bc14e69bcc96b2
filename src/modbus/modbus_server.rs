// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus RTU slave service backed by a compiled register map
//!
//! The simulated device is a read-only slave: holding registers are served
//! from the current [`RegisterMap`](crate::register_map::RegisterMap) snapshot
//! and write requests are acknowledged without changing anything.
//!
//! ## Function codes
//!
//! | Code | Request                      | Behaviour                                  |
//! |------|------------------------------|--------------------------------------------|
//! | 0x03 | Read Holding Registers       | served from the map                        |
//! | 0x06 | Write Single Register        | observed, echoed, map unchanged            |
//! | 0x10 | Write Multiple Registers     | observed, echoed, map unchanged            |
//! | 0x16 | Mask Write Register          | observed, echoed, map unchanged            |
//! | 0x17 | Read/Write Multiple Registers| write observed, read served from the map   |
//! | any  | anything else                | `IllegalFunction` exception                |
//!
//! Requests addressed to another unit id get no response at all. Broadcast
//! writes (unit 0) are observed but, as on a real bus, never answered.

use std::future;
use std::sync::Arc;

use log::{debug, warn};
use tokio_modbus::prelude::*;
use tokio_modbus::server::Service;

use crate::register_map::{
    read, ReadFault, ReadFaultKind, SharedRegisterMap, WriteAttempt, WriteObserver,
};

pub const FC_WRITE_SINGLE_REGISTER: u8 = 0x06;
pub const FC_WRITE_MULTIPLE_REGISTERS: u8 = 0x10;
pub const FC_MASK_WRITE_REGISTER: u8 = 0x16;
pub const FC_READ_WRITE_MULTIPLE_REGISTERS: u8 = 0x17;

/// Unit id used by masters to address every slave on the bus
pub const BROADCAST_UNIT_ID: u8 = 0;

/// Default observer: logs write attempts and, optionally, reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver {
    log_reads: bool,
}

impl LogObserver {
    pub fn new(log_reads: bool) -> Self {
        Self { log_reads }
    }
}

impl WriteObserver for LogObserver {
    fn on_write_attempt(&self, attempt: &WriteAttempt) {
        let last = attempt
            .address
            .saturating_add((attempt.values.len() as u16).saturating_sub(1));
        warn!(
            "Write ignored at HR[{}..{}]: {:?} (FC 0x{:02X})",
            attempt.address, last, attempt.values, attempt.function_code
        );
    }

    fn on_read(&self, address: u16, count: u16) {
        if self.log_reads {
            debug!("READ HR[{}] x{}", address, count);
        }
    }
}

/// Map a dispatcher fault onto the exception sent back to the master.
pub fn exception_for(fault: &ReadFault) -> ExceptionCode {
    match fault.kind {
        ReadFaultKind::IllegalDataAddress => ExceptionCode::IllegalDataAddress,
        ReadFaultKind::IllegalDataValue => ExceptionCode::IllegalDataValue,
    }
}

/// `tokio_modbus` service answering for a single unit id.
pub struct RegisterMapService {
    map: SharedRegisterMap,
    slave_id: u8,
    strict_gaps: bool,
    observer: Arc<dyn WriteObserver>,
}

impl RegisterMapService {
    pub fn new(map: SharedRegisterMap, slave_id: u8, strict_gaps: bool) -> Self {
        Self {
            map,
            slave_id,
            strict_gaps,
            observer: Arc::new(LogObserver::default()),
        }
    }

    /// Replace the default [`LogObserver`].
    pub fn with_observer(mut self, observer: Arc<dyn WriteObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn slave_id(&self) -> u8 {
        self.slave_id
    }

    /// Handle one request.
    ///
    /// `Ok(None)` means the request must stay unanswered: another unit id, or
    /// a broadcast.
    pub fn handle(&self, req: SlaveRequest<'_>) -> Result<Option<Response>, ExceptionCode> {
        let SlaveRequest { slave, request } = req;
        let broadcast = slave == BROADCAST_UNIT_ID;
        if slave != self.slave_id && !broadcast {
            debug!("Ignoring request for unit {}: {:?}", slave, request);
            return Ok(None);
        }
        debug!("Received Modbus request for unit {}: {:?}", slave, request);

        let response = match request {
            Request::ReadHoldingRegisters(addr, cnt) => {
                if broadcast {
                    return Ok(None);
                }
                self.read_holding(addr, cnt)
                    .map(Response::ReadHoldingRegisters)
            }
            Request::WriteSingleRegister(addr, value) => {
                self.observe(FC_WRITE_SINGLE_REGISTER, addr, vec![value]);
                Ok(Response::WriteSingleRegister(addr, value))
            }
            Request::WriteMultipleRegisters(addr, values) => {
                let quantity = values.len() as u16;
                self.observe(FC_WRITE_MULTIPLE_REGISTERS, addr, values.into_owned());
                Ok(Response::WriteMultipleRegisters(addr, quantity))
            }
            Request::MaskWriteRegister(addr, and_mask, or_mask) => {
                self.observe(FC_MASK_WRITE_REGISTER, addr, vec![and_mask, or_mask]);
                Ok(Response::MaskWriteRegister(addr, and_mask, or_mask))
            }
            Request::ReadWriteMultipleRegisters(read_addr, read_cnt, write_addr, values) => {
                self.observe(
                    FC_READ_WRITE_MULTIPLE_REGISTERS,
                    write_addr,
                    values.into_owned(),
                );
                if broadcast {
                    return Ok(None);
                }
                self.read_holding(read_addr, read_cnt)
                    .map(Response::ReadWriteMultipleRegisters)
            }
            other => {
                if broadcast {
                    return Ok(None);
                }
                warn!(
                    "Exception::IllegalFunction - Unsupported function code in request: {:?}",
                    other
                );
                Err(ExceptionCode::IllegalFunction)
            }
        };

        if broadcast {
            return Ok(None);
        }
        response.map(Some)
    }

    fn read_holding(&self, addr: u16, cnt: u16) -> Result<Vec<u16>, ExceptionCode> {
        self.observer.on_read(addr, cnt);
        let map = self.map.current();
        read(&map, addr, cnt, self.strict_gaps).map_err(|fault| {
            warn!("Modbus read rejected: {}", fault);
            exception_for(&fault)
        })
    }

    fn observe(&self, function_code: u8, address: u16, values: Vec<u16>) {
        self.observer.on_write_attempt(&WriteAttempt {
            function_code,
            address,
            values,
        });
    }
}

impl Service for RegisterMapService {
    type Request = SlaveRequest<'static>;
    type Response = Option<Response>;
    type Exception = ExceptionCode;
    type Future = future::Ready<Result<Self::Response, Self::Exception>>;

    fn call(&self, req: Self::Request) -> Self::Future {
        future::ready(self.handle(req))
    }
}
