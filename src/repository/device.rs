//! Repository implementation for devices.

use chrono::Utc;
use diesel::prelude::*;

use crate::domain::device::{Device, DeviceDetails, NewDevice};
use crate::domain::types::DeviceId;
use crate::models::device::{
    Device as DbDevice, NewDevice as DbNewDevice, UpdateDevice as DbUpdateDevice,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DeviceReader, DeviceWriter, DieselRepository};

impl DeviceReader for DieselRepository {
    fn get_device_by_id(&self, id: DeviceId) -> RepositoryResult<Option<Device>> {
        use crate::schema::devices;

        let mut conn = self.conn()?;

        let device = devices::table
            .find(id.to_string())
            .select(DbDevice::as_select())
            .first::<DbDevice>(&mut conn)
            .optional()?;

        device
            .map(Device::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    fn list_active_devices(&self) -> RepositoryResult<Vec<Device>> {
        use crate::schema::devices;

        let mut conn = self.conn()?;

        let rows = devices::table
            .filter(devices::is_active.eq(true))
            .order(devices::created_at.desc())
            .select(DbDevice::as_select())
            .load::<DbDevice>(&mut conn)?;

        rows.into_iter()
            .map(|row| Device::try_from(row).map_err(RepositoryError::from))
            .collect()
    }
}

impl DeviceWriter for DieselRepository {
    fn create_device(&self, new_device: &NewDevice) -> RepositoryResult<Device> {
        use crate::schema::devices;

        let mut conn = self.conn()?;

        let db_new_device = DbNewDevice::from_domain(new_device, Utc::now().naive_utc());

        let row = diesel::insert_into(devices::table)
            .values(&db_new_device)
            .returning(DbDevice::as_returning())
            .get_result::<DbDevice>(&mut conn)?;

        Device::try_from(row).map_err(RepositoryError::from)
    }

    fn update_device(&self, id: DeviceId, details: &DeviceDetails) -> RepositoryResult<Device> {
        use crate::schema::devices;

        let mut conn = self.conn()?;

        let db_updates = DbUpdateDevice::from_domain(details, Utc::now().naive_utc());

        let row = diesel::update(devices::table.find(id.to_string()))
            .set(&db_updates)
            .returning(DbDevice::as_returning())
            .get_result::<DbDevice>(&mut conn)?;

        Device::try_from(row).map_err(RepositoryError::from)
    }

    fn deactivate_device(&self, id: DeviceId) -> RepositoryResult<Device> {
        use crate::schema::devices;

        let mut conn = self.conn()?;

        let row = diesel::update(devices::table.find(id.to_string()))
            .set((
                devices::is_active.eq(false),
                devices::updated_at.eq(Utc::now().naive_utc()),
            ))
            .returning(DbDevice::as_returning())
            .get_result::<DbDevice>(&mut conn)?;

        Device::try_from(row).map_err(RepositoryError::from)
    }
}
