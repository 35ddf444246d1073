//! services/ocr_service.rs
//! Extracción de texto con Tesseract. Los PDF se rasterizan antes con
//! pdftoppm (solo la primera página).

use std::{
    fs,
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::{
    process::Command,
    sync::{Semaphore, SemaphorePermit},
    time::timeout,
};

use crate::config::app_config::AppConfig;

/// Cantidad máxima de tesseract simultáneos
const MAX_CONCURRENT_PROCESSES: usize = 4;
/// Prefijo de carpeta temporal
const TEMP_DIR_PREFIX: &str = "ocr_service_";
const PDF_DPI: &str = "300";

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, bytes: &[u8]) -> Result<String>;

    async fn extract_text_from_base64(&self, encoded: &str) -> Result<String> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .context("Erro ao processar base64")?;
        self.extract_text(&bytes).await
    }
}

#[derive(Clone)]
pub struct OcrService {
    semaphore: Arc<Semaphore>,
    tesseract_path: Arc<PathBuf>,
    pdftoppm_path: Option<Arc<PathBuf>>,
    language: String,
    timeout: Duration,
}

impl OcrService {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let tesseract_path = match &config.tesseract_path {
            Some(path) => which::which(path)
                .with_context(|| format!("TESSERACT_PATH no es ejecutable: {:?}", path))?,
            None => which::which("tesseract").context("No se encontró tesseract en el sistema")?,
        };

        // Sin pdftoppm el servicio sigue funcionando, pero rechaza PDF
        let pdftoppm_path = match which::which("pdftoppm") {
            Ok(path) => Some(Arc::new(path)),
            Err(_) => {
                log::warn!("pdftoppm no encontrado: los PDF no podrán procesarse");
                None
            }
        };

        log::info!(
            "OCR listo: tesseract={:?} idioma={}",
            tesseract_path,
            config.ocr_language
        );

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_PROCESSES)),
            tesseract_path: Arc::new(tesseract_path),
            pdftoppm_path,
            language: config.ocr_language.clone(),
            timeout: config.ocr_timeout,
        })
    }

    async fn acquire_permit(&self) -> Result<SemaphorePermit> {
        timeout(self.timeout, self.semaphore.acquire())
            .await
            .context("Timeout esperando permiso en OcrService")?
            .map_err(|_| anyhow!("No se pudo adquirir el semaphore"))
    }

    async fn run(&self, bytes: &[u8]) -> Result<String> {
        let _guard = self.acquire_permit().await?;

        // El directorio se borra al salir de scope
        let workdir = tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .tempdir()
            .context("No se pudo crear directorio temporal")?;

        let image_path = if is_pdf(bytes) {
            log::info!("Detectado PDF, convirtiendo primera página a imagen...");
            let pdf_path = workdir.path().join("input.pdf");
            fs::write(&pdf_path, bytes).context("Error escribiendo PDF temporal")?;
            self.rasterize(&pdf_path, workdir.path()).await?
        } else {
            let path = workdir.path().join("input.img");
            fs::write(&path, bytes).context("Error escribiendo imagen temporal")?;
            path
        };

        let mut cmd = Command::new(&*self.tesseract_path);
        cmd.arg(&image_path)
            .arg("stdout")
            .args(["-l", self.language.as_str(), "--psm", "6", "--oem", "3"]);
        let stdout = self.run_command(cmd, "tesseract").await?;

        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    /// Convierte la primera página del PDF en un PNG dentro de `dir`.
    async fn rasterize(&self, pdf_path: &Path, dir: &Path) -> Result<PathBuf> {
        let pdftoppm = self
            .pdftoppm_path
            .as_ref()
            .ok_or_else(|| anyhow!("pdftoppm no disponible para convertir PDF"))?;

        let prefix = dir.join("page");
        let mut cmd = Command::new(&**pdftoppm);
        cmd.args(["-f", "1", "-l", "1", "-r", PDF_DPI, "-png", "-singlefile"])
            .arg(pdf_path)
            .arg(&prefix);
        self.run_command(cmd, "pdftoppm").await?;

        let png = prefix.with_extension("png");
        if !png.exists() {
            return Err(anyhow!("Não foi possível converter PDF"));
        }
        Ok(png)
    }

    async fn run_command(&self, mut cmd: Command, name: &str) -> Result<Vec<u8>> {
        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(self.timeout, cmd.output())
            .await
            .with_context(|| format!("Timeout ejecutando {}", name))?
            .with_context(|| format!("No se pudo lanzar {}", name))?;

        if !output.status.success() {
            let stderr_msg = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("{} falló: {}", name, stderr_msg.trim()));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl TextExtractor for OcrService {
    async fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let start = Instant::now();
        log::info!("Iniciando OCR con Tesseract ({} bytes)", bytes.len());

        let text = self.run(bytes).await.map_err(|e| {
            log::error!("Error en el OCR: {:#}", e);
            anyhow!("Erro ao extrair texto: {:#}", e)
        })?;

        log::info!(
            "OCR concluido en {:.2}s: {} caracteres extraídos",
            start.elapsed().as_secs_f32(),
            text.len()
        );
        Ok(text)
    }
}

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}
