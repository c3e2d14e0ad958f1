/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 历史生成图像缓冲池（replay buffer）
 *
 * 判别器用缓冲池里的历史假图像训练，而不只用当前生成器刚生成的那一批，
 * 以减弱判别器与生成器瞬时状态之间的相关性。
 */

use crate::errors::TensorError;
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;

pub struct ImagePool {
    pool_size: usize,
    images: Vec<Tensor>,
    rng: StdRng,
}

impl ImagePool {
    /// `pool_size`为0时不缓存，`query`原样返回输入
    pub fn new(pool_size: usize, seed: Option<u64>) -> Self {
        Self {
            pool_size,
            images: Vec::with_capacity(pool_size),
            rng: seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64),
        }
    }

    pub const fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// 当前缓存的图像数
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// 按 batch 中的每个样本查询：
    /// - 池未满：存入该样本并原样返回
    /// - 池已满：各以 0.5 的概率返回该样本，或返回池中随机一张并用该样本替换它
    ///
    /// 返回与输入同形状的新张量
    pub fn query(&mut self, images: &Tensor) -> Result<Tensor, TensorError> {
        if self.pool_size == 0 {
            return Ok(images.clone());
        }
        let batch = images.shape().first().copied().unwrap_or(0);
        let coin = Uniform::new(0.0f32, 1.0);
        let slot = Uniform::new(0, self.pool_size);

        let mut returned = Vec::with_capacity(batch);
        for i in 0..batch {
            let image = images.select_batch(i)?;
            if self.images.len() < self.pool_size {
                self.images.push(image.clone());
                returned.push(image);
            } else if coin.sample(&mut self.rng) > 0.5 {
                let id = slot.sample(&mut self.rng);
                returned.push(std::mem::replace(&mut self.images[id], image));
            } else {
                returned.push(image);
            }
        }
        Tensor::concat_batch(&returned)
    }
}
