use std::sync::Arc;

use k8s_openapi::api::core::v1::Service;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;

/// The two cluster API calls the patcher needs. Implemented for
/// [`kube::Client`] and for any `Arc` of an implementation.
#[async_trait::async_trait]
pub trait ServiceApi: Send + Sync {
    /// Fetches the full Service object `name` in `namespace`.
    async fn get(&self, namespace: &str, name: &str) -> Result<Service, kube::Error>;

    /// Merge-patches the Service `name` in `namespace` with `service`.
    async fn patch(
        &self,
        namespace: &str,
        name: &str,
        service: &Service,
        params: &PatchParams,
    ) -> Result<Service, kube::Error>;
}

#[async_trait::async_trait]
impl ServiceApi for Client {
    async fn get(&self, namespace: &str, name: &str) -> Result<Service, kube::Error> {
        Api::<Service>::namespaced(self.clone(), namespace)
            .get(name)
            .await
    }

    async fn patch(
        &self,
        namespace: &str,
        name: &str,
        service: &Service,
        params: &PatchParams,
    ) -> Result<Service, kube::Error> {
        Api::<Service>::namespaced(self.clone(), namespace)
            .patch(name, params, &Patch::Merge(service))
            .await
    }
}

#[async_trait::async_trait]
impl<T> ServiceApi for Arc<T>
where
    T: ServiceApi + ?Sized,
{
    async fn get(&self, namespace: &str, name: &str) -> Result<Service, kube::Error> {
        (**self).get(namespace, name).await
    }

    async fn patch(
        &self,
        namespace: &str,
        name: &str,
        service: &Service,
        params: &PatchParams,
    ) -> Result<Service, kube::Error> {
        (**self).patch(namespace, name, service, params).await
    }
}
