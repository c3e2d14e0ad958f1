/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : CycleGAN 模型与训练步编排
 *
 * 一个训练步（optimize_parameters）严格按以下顺序：
 * Init -> Forwarded              前向得到全部派生图像
 *      -> GeneratorUpdated       冻结 D_A、D_B；清零 G 梯度；G 目标反向传播；G 优化器 step
 *      -> DiscriminatorUpdatedA  解冻 D_A、D_B；清零 D 梯度；D_A 用 real_B 与缓冲池中的 fake_B
 *      -> DiscriminatorUpdatedB  D_B 用 real_A 与缓冲池中的 fake_A
 *      -> Done                   D 优化器 step（覆盖两个判别器），记录损失
 *
 * 任一阶段出错即中止并向上返回，优化器只在反向传播成功之后才 step。
 * 命名与论文的对应：G_A(G)、G_B(F)、D_A(D_Y)、D_B(D_X)。
 */

use super::{
    CycleGanError, CycleGanOptions, DerivedImages, DiscriminatorObjective, GeneratorObjective,
    LOSS_NAMES, LossRecord, LossVariantPolicy, UnpairedBatch, forward_pass, gate,
};
use crate::errors::ConfigError;
use crate::image_pool::ImagePool;
use crate::networks::{
    DiscriminatorSpec, GeneratorSpec, ImageNetwork, define_discriminator, define_generator,
};
use crate::nn::{Adam, Device, Graph, GraphError, Optimizer, Var};
use crate::tensor::Tensor;
use tracing::{debug, info, trace, warn};

/// 训练步所处的阶段（最近完成的阶段）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    Init,
    Forwarded,
    GeneratorUpdated,
    DiscriminatorUpdatedA,
    DiscriminatorUpdatedB,
    Done,
}

/// 只在训练时存在的部分
struct Trainer {
    d_a: Box<dyn ImageNetwork>,
    d_b: Box<dyn ImageNetwork>,
    optimizer_g: Adam,
    optimizer_d: Adam,
    fake_a_pool: ImagePool,
    fake_b_pool: ImagePool,
    policy: LossVariantPolicy,
}

impl Trainer {
    fn discriminators(&self) -> [&dyn ImageNetwork; 2] {
        [self.d_a.as_ref(), self.d_b.as_ref()]
    }
}

pub struct CycleGanModel {
    options: CycleGanOptions,
    graph: Graph,
    g_a: Box<dyn ImageNetwork>,
    g_b: Box<dyn ImageNetwork>,
    trainer: Option<Trainer>,
    real_a: Option<Var>,
    real_b: Option<Var>,
    image_paths: Vec<String>,
    images: Option<DerivedImages>,
    losses: LossRecord,
    phase: StepPhase,
}

impl CycleGanModel {
    /// 按配置构建生成器、判别器、优化器与缓冲池
    pub fn new(options: CycleGanOptions) -> Result<Self, CycleGanError> {
        options.validate()?;
        let device = Device::from_gpu_ids(&options.gpu_ids)?;
        let graph = Graph::with_device(device, options.seed);

        let arch = options.generator_arch()?;
        let generator = |name: &str, input_nc, output_nc| GeneratorSpec {
            name: name.to_string(),
            input_nc,
            output_nc,
            ngf: options.ngf,
            arch,
            norm: options.norm,
            use_dropout: !options.no_dropout,
            init: options.init_type,
            init_gain: options.init_gain,
        };
        let g_a = define_generator(&graph, &generator("G_A", options.input_nc, options.output_nc))?;
        let g_b = define_generator(&graph, &generator("G_B", options.output_nc, options.input_nc))?;

        let policy = Self::resolve_policy(&options)?;
        let discriminators = if let Some(policy) = &policy {
            let arch = options.discriminator_arch()?;
            let discriminator = |name: &str, input_nc| DiscriminatorSpec {
                name: name.to_string(),
                input_nc,
                ndf: options.ndf,
                arch,
                norm: policy.discriminator_norm(options.norm),
                use_sigmoid: policy.use_sigmoid(),
                init: options.init_type,
                init_gain: options.init_gain,
            };
            let d_a = define_discriminator(&graph, &discriminator("D_A", options.output_nc))?;
            let d_b = define_discriminator(&graph, &discriminator("D_B", options.input_nc))?;
            Some((d_a, d_b))
        } else {
            None
        };

        Self::assemble(options, policy, graph, g_a, g_b, discriminators)
    }

    /// 用现成的网络组装模型（网络须建在`graph`上）
    ///
    /// 训练模式下`discriminators`必须提供；推理模式下忽略
    pub fn from_networks(
        options: CycleGanOptions,
        graph: Graph,
        g_a: Box<dyn ImageNetwork>,
        g_b: Box<dyn ImageNetwork>,
        discriminators: Option<(Box<dyn ImageNetwork>, Box<dyn ImageNetwork>)>,
    ) -> Result<Self, CycleGanError> {
        options.validate()?;
        let policy = Self::resolve_policy(&options)?;
        Self::assemble(options, policy, graph, g_a, g_b, discriminators)
    }

    /// 推理模式不需要损失策略
    fn resolve_policy(options: &CycleGanOptions) -> Result<Option<LossVariantPolicy>, ConfigError> {
        if options.is_train {
            LossVariantPolicy::resolve(options).map(Some)
        } else {
            Ok(None)
        }
    }

    fn assemble(
        options: CycleGanOptions,
        policy: Option<LossVariantPolicy>,
        graph: Graph,
        g_a: Box<dyn ImageNetwork>,
        g_b: Box<dyn ImageNetwork>,
        discriminators: Option<(Box<dyn ImageNetwork>, Box<dyn ImageNetwork>)>,
    ) -> Result<Self, CycleGanError> {
        let trainer = match (policy, discriminators) {
            (Some(policy), Some((d_a, d_b))) => {
                let mut g_params = g_a.parameters();
                g_params.extend(g_b.parameters());
                let mut d_params = d_a.parameters();
                d_params.extend(d_b.parameters());
                let adam = |params: &[Var]| {
                    Adam::with_config(params, options.lr, options.beta1, 0.999, 1e-8)
                };
                Some(Trainer {
                    optimizer_g: adam(&g_params),
                    optimizer_d: adam(&d_params),
                    fake_a_pool: ImagePool::new(options.pool_size, options.seed.map(|s| s.wrapping_add(1))),
                    fake_b_pool: ImagePool::new(options.pool_size, options.seed.map(|s| s.wrapping_add(2))),
                    d_a,
                    d_b,
                    policy,
                })
            }
            (Some(_), None) => {
                return Err(GraphError::InvalidOperation(
                    "训练模式需要判别器 D_A、D_B".to_string(),
                )
                .into());
            }
            (None, _) => None,
        };

        let model = Self {
            options,
            graph,
            g_a,
            g_b,
            trainer,
            real_a: None,
            real_b: None,
            image_paths: Vec::new(),
            images: None,
            losses: LossRecord::default(),
            phase: StepPhase::Init,
        };
        model.print_networks();
        Ok(model)
    }

    fn print_networks(&self) {
        for (name, net) in self.networks() {
            info!("[{name}] 参数总数：{:.3} M", net.num_params() as f64 / 1e6);
        }
    }

    fn networks(&self) -> Vec<(&'static str, &dyn ImageNetwork)> {
        let mut networks: Vec<(&'static str, &dyn ImageNetwork)> =
            vec![("G_A", self.g_a.as_ref()), ("G_B", self.g_b.as_ref())];
        if let Some(trainer) = &self.trainer {
            networks.push(("D_A", trainer.d_a.as_ref()));
            networks.push(("D_B", trainer.d_b.as_ref()));
        }
        networks
    }

    pub fn name(&self) -> &'static str {
        "CycleGANModel"
    }

    pub const fn options(&self) -> &CycleGanOptions {
        &self.options
    }

    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    pub const fn phase(&self) -> StepPhase {
        self.phase
    }

    pub fn is_train(&self) -> bool {
        self.trainer.is_some()
    }

    pub fn policy(&self) -> Option<&LossVariantPolicy> {
        self.trainer.as_ref().map(|t| &t.policy)
    }

    pub fn generators(&self) -> [&dyn ImageNetwork; 2] {
        [self.g_a.as_ref(), self.g_b.as_ref()]
    }

    /// 训练模式下的 [D_A, D_B]
    pub fn discriminators(&self) -> Option<[&dyn ImageNetwork; 2]> {
        self.trainer.as_ref().map(Trainer::discriminators)
    }

    /// 需要保存/加载的网络名称
    pub fn model_names(&self) -> Vec<&'static str> {
        self.networks().into_iter().map(|(name, _)| name).collect()
    }

    /// 载入一个批次，按`direction`决定哪个键作为 A 域
    pub fn set_input(&mut self, batch: &UnpairedBatch) {
        let (a, b, paths) = batch.select(self.options.direction);
        self.real_a = Some(self.graph.input(a));
        self.real_b = Some(self.graph.input(b));
        self.image_paths = paths.to_vec();
        self.images = None;
        self.phase = StepPhase::Init;
    }

    pub fn image_paths(&self) -> &[String] {
        &self.image_paths
    }

    fn inputs(&self) -> Result<(Var, Var), GraphError> {
        match (&self.real_a, &self.real_b) {
            (Some(a), Some(b)) => Ok((a.clone(), b.clone())),
            _ => Err(GraphError::InvalidOperation("请先调用 set_input".to_string())),
        }
    }

    fn uses_identity(&self) -> bool {
        self.trainer
            .as_ref()
            .is_some_and(|t| t.policy.weights.uses_identity())
    }

    /// 前向：生成 fake_B、rec_A、fake_A、rec_B（以及训练且 λ_idt > 0 时的 idt_A、idt_B）
    pub fn forward(&mut self) -> Result<(), CycleGanError> {
        let (real_a, real_b) = self.inputs()?;
        let images = forward_pass(
            self.g_a.as_ref(),
            self.g_b.as_ref(),
            &real_a,
            &real_b,
            self.uses_identity(),
        )?;
        self.images = Some(images);
        self.phase = StepPhase::Forwarded;
        trace!("前向完成");
        Ok(())
    }

    /// 不记录梯度的前向，用于推理/评估
    pub fn test(&mut self) -> Result<(), CycleGanError> {
        let graph = self.graph.clone();
        graph.no_grad_scope(|| self.forward())
    }

    fn expect_phase(&self, expected: StepPhase, action: &str) -> Result<(), GraphError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(GraphError::InvalidOperation(format!(
                "{action}要求处于{expected:?}阶段，当前为{:?}",
                self.phase
            )))
        }
    }

    fn trainer_mut(&mut self) -> Result<&mut Trainer, GraphError> {
        self.trainer
            .as_mut()
            .ok_or_else(|| GraphError::InvalidOperation("模型不处于训练模式".to_string()))
    }

    /// 生成器阶段：冻结判别器 -> 清零 G 梯度 -> 反向传播 -> G 优化器 step
    ///
    /// 出错时先解冻判别器再返回错误，不会有参数停留在冻结状态
    pub fn update_generators(&mut self) -> Result<(), CycleGanError> {
        self.expect_phase(StepPhase::Forwarded, "生成器更新")?;
        let (real_a, real_b) = self.inputs()?;
        let trainer = self
            .trainer
            .as_mut()
            .ok_or_else(|| GraphError::InvalidOperation("模型不处于训练模式".to_string()))?;
        let images = self
            .images
            .as_ref()
            .ok_or_else(|| GraphError::InvalidOperation("请先调用 forward".to_string()))?;

        let discriminators = [trainer.d_a.as_ref(), trainer.d_b.as_ref()];
        gate::freeze(&discriminators)?;
        trainer.optimizer_g.zero_grad();
        let objective = GeneratorObjective::new(&trainer.policy);
        let result = objective.backward(
            trainer.d_a.as_ref(),
            trainer.d_b.as_ref(),
            &real_a,
            &real_b,
            images,
        );
        let loss = match result.and_then(|loss| trainer.optimizer_g.step().map(|()| loss)) {
            Ok(loss) => loss,
            Err(e) => {
                gate::unfreeze(&discriminators)?;
                return Err(e.into());
            }
        };

        self.losses.g_a = loss.g_a;
        self.losses.g_b = loss.g_b;
        self.losses.cycle_a = loss.cycle_a;
        self.losses.cycle_b = loss.cycle_b;
        self.losses.idt_a = loss.idt_a;
        self.losses.idt_b = loss.idt_b;
        self.losses.mode_seeking = loss.mode_seeking;
        self.losses.g = loss.total;
        self.phase = StepPhase::GeneratorUpdated;
        trace!("生成器更新完成，loss_G = {}", loss.total);
        Ok(())
    }

    /// 判别器阶段：解冻 -> 清零 D 梯度 -> D_A、D_B 各自反向传播 -> D 优化器 step
    pub fn update_discriminators(&mut self) -> Result<(), CycleGanError> {
        self.expect_phase(StepPhase::GeneratorUpdated, "判别器更新")?;
        let (real_a, real_b) = self.inputs()?;
        let (fake_a, fake_b) = match &self.images {
            Some(images) => (images.fake_a.value(), images.fake_b.value()),
            None => {
                return Err(GraphError::InvalidOperation("请先调用 forward".to_string()).into());
            }
        };
        let graph = self.graph.clone();
        let trainer = self.trainer_mut()?;

        gate::unfreeze(&trainer.discriminators())?;
        trainer.optimizer_d.zero_grad();

        let objective = DiscriminatorObjective::new(&trainer.policy);
        let pooled_fake_b = graph.input(&trainer.fake_b_pool.query(&fake_b)?);
        let loss_a = objective.backward(trainer.d_a.as_ref(), &real_b, &pooled_fake_b)?;
        self.phase = StepPhase::DiscriminatorUpdatedA;
        trace!("D_A 反向传播完成，loss_D_A = {}", loss_a.loss);

        let trainer = self.trainer_mut()?;
        let objective = DiscriminatorObjective::new(&trainer.policy);
        let pooled_fake_a = graph.input(&trainer.fake_a_pool.query(&fake_a)?);
        let loss_b = objective.backward(trainer.d_b.as_ref(), &real_a, &pooled_fake_a)?;
        self.phase = StepPhase::DiscriminatorUpdatedB;
        trace!("D_B 反向传播完成，loss_D_B = {}", loss_b.loss);

        self.trainer_mut()?.optimizer_d.step()?;

        self.losses.d_a = loss_a.loss;
        self.losses.d_b = loss_b.loss;
        self.losses.gradient_penalty_a = loss_a.gradient_penalty;
        self.losses.gradient_penalty_b = loss_b.gradient_penalty;
        self.phase = StepPhase::Done;
        Ok(())
    }

    /// 完整的一个训练步
    pub fn optimize_parameters(&mut self) -> Result<(), CycleGanError> {
        if !self.is_train() {
            return Err(GraphError::InvalidOperation(
                "推理模式的模型不能训练".to_string(),
            )
            .into());
        }
        self.forward()?;
        self.update_generators()?;
        self.update_discriminators()?;

        debug!("{:?}", self.losses);
        if !self.losses.is_finite() {
            warn!("训练步产生了非有限的损失：{:?}", self.losses);
        }
        Ok(())
    }

    /// 最近一个训练步的全部损失
    pub const fn losses(&self) -> &LossRecord {
        &self.losses
    }

    /// `LOSS_NAMES`顺序的 (名称, 值)
    pub fn current_losses(&self) -> Vec<(&'static str, f32)> {
        self.losses.named()
    }

    pub fn loss_names(&self) -> &'static [&'static str] {
        &LOSS_NAMES
    }

    /// 可视化的图像名称；恒等图像只在训练且 λ_idt > 0 时出现
    pub fn visual_names(&self) -> Vec<&'static str> {
        let mut names_a = vec!["real_A", "fake_B", "rec_A"];
        let mut names_b = vec!["real_B", "fake_A", "rec_B"];
        if self.uses_identity() {
            names_a.push("idt_A");
            names_b.push("idt_B");
        }
        names_a.extend(names_b);
        names_a
    }

    /// 当前可用的可视化图像，按`visual_names`顺序
    pub fn current_visuals(&self) -> Vec<(&'static str, Tensor)> {
        self.visual_names()
            .into_iter()
            .filter_map(|name| self.visual(name).map(|v| (name, v.value())))
            .collect()
    }

    fn visual(&self, name: &str) -> Option<&Var> {
        let images = self.images.as_ref();
        match name {
            "real_A" => self.real_a.as_ref(),
            "real_B" => self.real_b.as_ref(),
            "fake_B" => images.map(|i| &i.fake_b),
            "rec_A" => images.map(|i| &i.rec_a),
            "fake_A" => images.map(|i| &i.fake_a),
            "rec_B" => images.map(|i| &i.rec_b),
            "idt_A" => images.and_then(|i| i.idt_a.as_ref()),
            "idt_B" => images.and_then(|i| i.idt_b.as_ref()),
            _ => None,
        }
    }

    /// 最近一次前向的派生图像
    pub fn derived_images(&self) -> Option<&DerivedImages> {
        self.images.as_ref()
    }
}
